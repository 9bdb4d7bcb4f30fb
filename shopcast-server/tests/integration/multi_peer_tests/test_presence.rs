use shopcast_core::{PeerId, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::Harness;

fn user_joined(id: &str) -> ServerMessage {
    ServerMessage::UserJoined {
        client_id: PeerId::from(id),
    }
}

fn user_left(id: &str) -> ServerMessage {
    ServerMessage::UserLeft {
        client_id: PeerId::from(id),
    }
}

#[tokio::test]
async fn test_join_and_leave_are_announced_to_the_room() {
    init_tracing();

    let harness = Harness::new();
    let mut seller = harness.connect();
    let mut bob = harness.connect();
    let mut carol = harness.connect();

    seller.join("seller-1", "alice", "publisher").await;
    bob.join("seller-1", "bob", "viewer").await;
    assert_eq!(seller.recv().await.message, user_joined("bob"));
    // The newcomer only gets its own `joined`.
    assert!(bob.drain().is_empty());

    carol.join("seller-1", "carol", "viewer").await;
    assert_eq!(seller.recv().await.message, user_joined("carol"));
    assert_eq!(bob.recv().await.message, user_joined("carol"));

    bob.disconnect().await;
    assert_eq!(seller.recv().await.message, user_left("bob"));
    assert_eq!(carol.recv().await.message, user_left("bob"));
    assert!(carol.drain().is_empty());
}

#[tokio::test]
async fn test_rejoin_under_same_id_is_not_announced_as_leaving() {
    init_tracing();

    let harness = Harness::new();
    let mut seller = harness.connect();
    let mut first = harness.connect();
    let mut second = harness.connect();

    seller.join("seller-1", "alice", "publisher").await;
    first.join("seller-1", "bob", "viewer").await;
    second.join("seller-1", "bob", "viewer").await;

    let messages: Vec<ServerMessage> = seller.drain().into_iter().map(|e| e.message).collect();
    assert_eq!(messages, vec![user_joined("bob"), user_joined("bob")]);

    // The replaced connection no longer owns the entry.
    first.disconnect().await;
    assert!(seller.drain().is_empty());

    second.disconnect().await;
    assert_eq!(seller.recv().await.message, user_left("bob"));
}

#[tokio::test]
async fn test_peers_in_other_rooms_hear_nothing() {
    init_tracing();

    let harness = Harness::new();
    let mut seller_a = harness.connect();
    let mut seller_b = harness.connect();
    let mut viewer = harness.connect();

    seller_a.join("room-a", "alice", "publisher").await;
    seller_b.join("room-b", "carol", "publisher").await;
    viewer.join("room-a", "bob", "viewer").await;
    viewer.disconnect().await;

    let messages: Vec<ServerMessage> = seller_a.drain().into_iter().map(|e| e.message).collect();
    assert_eq!(messages, vec![user_joined("bob"), user_left("bob")]);
    assert!(seller_b.drain().is_empty());
}
