use shopcast_core::RoomId;
use shopcast_server::SfuConfig;
use std::sync::Arc;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::Harness;

fn short_ttl() -> Harness {
    Harness::with_config(SfuConfig {
        room_idle_ttl: Duration::from_secs(10),
        ..SfuConfig::default()
    })
}

#[tokio::test(start_paused = true)]
async fn test_empty_room_is_removed_after_ttl() {
    init_tracing();

    let harness = short_ttl();
    let room = RoomId::from("seller-1");
    let mut viewer = harness.connect();
    viewer.join("seller-1", "bob", "viewer").await;
    viewer.disconnect().await;

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert!(harness.service.registry().get(&room).is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(harness.service.registry().get(&room).is_none());
    assert!(harness.service.registry().stats(&room).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_room_rejoined_before_ttl_is_kept() {
    init_tracing();

    let harness = short_ttl();
    let room = RoomId::from("seller-1");
    let mut first = harness.connect();
    first.join("seller-1", "bob", "viewer").await;
    let original = harness.service.registry().get(&room).unwrap();
    first.disconnect().await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    let mut second = harness.connect();
    second.join("seller-1", "carol", "viewer").await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    let current = harness.service.registry().get(&room).expect("room kept");
    assert!(Arc::ptr_eq(&original, &current));
    assert_eq!(current.stats().await.clients, 1);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_counts_from_the_latest_emptying() {
    init_tracing();

    let harness = short_ttl();
    let room = RoomId::from("seller-1");
    let mut first = harness.connect();
    first.join("seller-1", "bob", "viewer").await;
    first.disconnect().await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    let mut second = harness.connect();
    second.join("seller-1", "carol", "viewer").await;
    tokio::time::sleep(Duration::from_secs(6)).await;
    second.disconnect().await;

    // Empty for only 2s when the first timer fires at t=10.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(harness.service.registry().get(&room).is_some());

    tokio::time::sleep(Duration::from_secs(8)).await;
    assert!(harness.service.registry().get(&room).is_none());
}

#[tokio::test]
async fn test_join_into_retired_room_gets_fresh_room() {
    init_tracing();

    let harness = Harness::new();
    let room = RoomId::from("seller-1");
    let stale = harness.service.registry().get_or_create(&room);
    assert!(stale.retire_if_idle(Duration::ZERO).await);

    let mut viewer = harness.connect();
    viewer.join("seller-1", "bob", "viewer").await;

    let current = harness.service.registry().get(&room).unwrap();
    assert!(!Arc::ptr_eq(&stale, &current));
    assert_eq!(current.stats().await.viewers, 1);
    assert!(stale.is_empty().await);
}
