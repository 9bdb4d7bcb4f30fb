use crate::integration::{eventually, init_tracing};
use crate::utils::Harness;

#[tokio::test]
async fn test_viewer_count_follows_membership() {
    init_tracing();

    let harness = Harness::new();
    let mut seller = harness.connect();
    let mut bob = harness.connect();
    let mut carol = harness.connect();

    seller.join("seller-1", "alice", "publisher").await;
    bob.join("seller-1", "bob", "viewer").await;
    assert!(harness.viewer_counts.wait_for("seller-1", 1).await);

    carol.join("seller-1", "carol", "viewer").await;
    assert!(harness.viewer_counts.wait_for("seller-1", 2).await);

    carol.disconnect().await;
    let counts = &harness.viewer_counts;
    assert!(eventually(|| async move { counts.updates_for("seller-1").len() == 3 }).await);

    // The publisher's join did not change the viewer count.
    assert_eq!(counts.updates_for("seller-1"), vec![1, 2, 1]);
}

#[tokio::test]
async fn test_counts_are_per_room() {
    init_tracing();

    let harness = Harness::new();
    let mut bob = harness.connect();
    let mut dave = harness.connect();

    bob.join("room-a", "bob", "viewer").await;
    dave.join("room-b", "dave", "viewer").await;

    assert!(harness.viewer_counts.wait_for("room-a", 1).await);
    assert!(harness.viewer_counts.wait_for("room-b", 1).await);
    assert_eq!(harness.viewer_counts.updates_for("room-a"), vec![1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rapid_membership_changes_report_in_order() {
    init_tracing();

    let harness = Harness::new();
    let mut viewers = Vec::new();
    for n in 0..5 {
        let mut viewer = harness.connect();
        viewer.join("seller-1", &format!("viewer-{n}"), "viewer").await;
        viewers.push(viewer);
    }
    for viewer in viewers {
        viewer.disconnect().await;
    }

    let counts = &harness.viewer_counts;
    assert!(eventually(|| async move { counts.updates_for("seller-1").len() == 10 }).await);
    assert_eq!(
        counts.updates_for("seller-1"),
        vec![1, 2, 3, 4, 5, 4, 3, 2, 1, 0]
    );
}
