use shopcast_core::ServerMessage;

use crate::integration::init_tracing;
use crate::utils::{FakeTrack, Harness};

#[tokio::test]
async fn test_late_viewer_has_tracks_before_joined() {
    init_tracing();

    let harness = Harness::new();
    let mut seller = harness.connect();
    let mut early = harness.connect();
    seller.join("seller-1", "alice", "publisher").await;
    early.join("seller-1", "erin", "viewer").await;

    let publisher = harness.sessions.session("alice");
    let (video, _video_tx) = FakeTrack::video("video");
    let (audio, _audio_tx) = FakeTrack::video("audio");
    assert!(publisher.emit_track(video).await);
    assert!(publisher.emit_track(audio).await);

    // One renegotiation per relayed track means both are recorded on the publisher.
    for _ in 0..2 {
        assert!(matches!(early.recv().await.message, ServerMessage::Offer(_)));
    }

    let mut viewer = harness.connect();
    viewer
        .send(serde_json::json!({
            "type": "join",
            "room": "seller-1",
            "data": { "client_id": "bob", "role": "viewer" },
        }))
        .await;

    // `joined` is only sent after the tracks were attached.
    let reply = viewer.recv().await;
    assert!(matches!(reply.message, ServerMessage::Joined { .. }));
    let mut ids = harness.sessions.session("bob").track_ids();
    ids.sort();
    assert_eq!(ids, vec!["audio", "video"]);
}
