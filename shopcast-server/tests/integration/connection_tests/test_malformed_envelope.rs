use serde_json::json;
use shopcast_core::RoomId;

use crate::integration::init_tracing;
use crate::utils::Harness;

#[tokio::test]
async fn test_malformed_envelopes_are_dropped() {
    init_tracing();

    let harness = Harness::new();
    let mut peer = harness.connect();

    peer.send_raw("definitely not json").await;
    peer.send(json!({ "type": "dance", "room": "r1", "data": {} })).await;
    peer.send(json!({ "type": "join", "room": "r1", "data": { "client_id": "a", "role": "admin" } }))
        .await;
    peer.send(json!({ "type": "join", "room": "r1", "data": { "client_id": "a" } }))
        .await;
    peer.send(json!({ "type": "offer", "room": "r1", "data": {} })).await;

    assert!(peer.drain().is_empty());
    assert!(harness.service.registry().get(&RoomId::from("r1")).is_none());

    // The same connection still works afterwards.
    peer.join("r1", "a", "viewer").await;
}
