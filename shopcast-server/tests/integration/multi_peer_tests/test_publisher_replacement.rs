use shopcast_core::{PeerId, Role, RoomId};

use crate::integration::init_tracing;
use crate::utils::Harness;

#[tokio::test]
async fn test_second_publisher_replaces_first() {
    init_tracing();

    let harness = Harness::new();
    let room = RoomId::from("seller-1");
    let mut first = harness.connect();
    let mut second = harness.connect();

    first.join("seller-1", "alice", "publisher").await;
    second.join("seller-1", "carol", "publisher").await;

    let stats = harness.service.registry().stats(&room).await.unwrap();
    assert_eq!(stats.publishers, 1);
    assert_eq!(stats.clients, 1);

    let members = harness.service.registry().get(&room).unwrap().members().await;
    assert_eq!(members, vec![(PeerId::from("carol"), Role::Publisher)]);
    assert!(harness.sessions.session("alice").is_closed());
    assert!(!harness.sessions.session("carol").is_closed());
}

#[tokio::test]
async fn test_publisher_rejoin_replaces_own_session() {
    init_tracing();

    let harness = Harness::new();
    let room = RoomId::from("seller-1");
    let mut seller = harness.connect();

    seller.join("seller-1", "alice", "publisher").await;
    seller.join("seller-1", "alice", "publisher").await;

    let sessions = harness.sessions.sessions_of("alice");
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].is_closed());
    assert!(!sessions[1].is_closed());
    assert_eq!(harness.service.registry().stats(&room).await.unwrap().clients, 1);
    assert_eq!(seller.dispatcher.memberships().len(), 1);
}
