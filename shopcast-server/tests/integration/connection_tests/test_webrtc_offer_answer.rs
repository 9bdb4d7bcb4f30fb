use serde_json::json;
use shopcast_core::{PeerId, ServerMessage};
use shopcast_server::{SfuConfig, SignalingService, TransportConfig};

use crate::integration::init_tracing;
use crate::utils::{TestClient, TestPeer};

fn loopback_service() -> SignalingService {
    SignalingService::with_webrtc(SfuConfig {
        transport: TransportConfig::from_stun_urls(Vec::<String>::new()),
        ..SfuConfig::default()
    })
}

#[tokio::test]
async fn test_publisher_offer_is_answered() {
    init_tracing();

    let service = loopback_service();
    let mut peer = TestPeer::connect(&service);
    let client = TestClient::new(PeerId::from("alice"))
        .await
        .expect("Failed to create test client");

    peer.join("seller-1", "alice", "publisher").await;

    client.add_video_track().await.expect("Failed to add track");
    let offer = client.create_offer().await.expect("Failed to create offer");
    assert!(offer.contains("v=0"));

    peer.send(json!({ "type": "offer", "room": "seller-1", "data": { "sdp": offer } }))
        .await;

    let ServerMessage::Answer(answer) = peer.recv_skipping_ice().await.message else {
        panic!("expected an answer");
    };
    assert!(answer.sdp.contains("m=video"));
    client
        .set_remote_answer(answer.sdp)
        .await
        .expect("answer must be applicable");

    client.close().await.expect("Failed to close client");
    peer.disconnect().await;
}

#[tokio::test]
async fn test_viewer_offer_is_answered() {
    init_tracing();

    let service = loopback_service();
    let mut peer = TestPeer::connect(&service);
    let client = TestClient::new(PeerId::from("bob"))
        .await
        .expect("Failed to create test client");

    peer.join("seller-1", "bob", "viewer").await;

    client.receive_video().await.expect("Failed to add transceiver");
    let offer = client.create_offer().await.expect("Failed to create offer");
    peer.send(json!({ "type": "offer", "room": "seller-1", "client_id": "bob", "data": { "sdp": offer } }))
        .await;

    let envelope = peer.recv_skipping_ice().await;
    assert_eq!(envelope.client_id, Some(PeerId::from("bob")));
    let ServerMessage::Answer(answer) = envelope.message else {
        panic!("expected an answer");
    };
    client
        .set_remote_answer(answer.sdp)
        .await
        .expect("answer must be applicable");

    client.close().await.expect("Failed to close client");
    peer.disconnect().await;
}
