use std::sync::Arc;
use tokio::sync::mpsc;

use super::{create_test_service, seed_user};
use crate::core::errors::SplitsyncError;
use crate::core::models::NotificationKind;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::realtime::NotificationRouter;

fn router() -> (Arc<InMemoryStorage>, NotificationRouter<InMemoryStorage>) {
    let storage = Arc::new(InMemoryStorage::new());
    (storage.clone(), NotificationRouter::new(storage))
}

#[tokio::test]
async fn publish_stores_then_delivers_in_order() {
    let (storage, router) = router();
    let (tx, mut rx) = mpsc::unbounded_channel();
    router.join("alice", "conn-1", tx).await;

    router
        .publish("alice", NotificationKind::Generic, "first".to_string())
        .await
        .unwrap();
    router
        .publish("alice", NotificationKind::Generic, "second".to_string())
        .await
        .unwrap();

    assert_eq!(rx.recv().await.unwrap().message, "first");
    assert_eq!(rx.recv().await.unwrap().message, "second");

    // Durable rows exist regardless of delivery.
    assert_eq!(storage.get_notifications("alice").await.unwrap().len(), 2);
    assert_eq!(storage.count_unread("alice").await.unwrap(), 2);
}

#[tokio::test]
async fn publish_without_connections_still_stores() {
    let (storage, router) = router();
    router
        .publish("alice", NotificationKind::Generic, "offline delivery".to_string())
        .await
        .unwrap();

    let stored = storage.get_notifications("alice").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].read);
}

#[tokio::test]
async fn events_only_reach_the_addressed_channel() {
    let (_storage, router) = router();
    let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
    let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
    router.join("alice", "conn-a", alice_tx).await;
    router.join("bob", "conn-b", bob_tx).await;

    router
        .publish("alice", NotificationKind::Generic, "for alice".to_string())
        .await
        .unwrap();

    assert_eq!(alice_rx.recv().await.unwrap().message, "for alice");
    assert!(bob_rx.try_recv().is_err());
}

#[tokio::test]
async fn rejoining_replaces_the_subscription() {
    let (_storage, router) = router();
    let (old_tx, _old_rx) = mpsc::unbounded_channel();
    let (new_tx, mut new_rx) = mpsc::unbounded_channel();
    router.join("alice", "conn-1", old_tx).await;
    router.join("alice", "conn-1", new_tx).await;
    assert_eq!(router.connection_count("alice").await, 1);

    router
        .publish("alice", NotificationKind::Generic, "hello".to_string())
        .await
        .unwrap();
    assert_eq!(new_rx.recv().await.unwrap().message, "hello");
}

#[tokio::test]
async fn leave_unsubscribes_and_dead_connections_get_pruned() {
    let (storage, router) = router();
    let (tx, rx) = mpsc::unbounded_channel();
    router.join("alice", "conn-1", tx).await;
    router.leave("conn-1").await;
    assert_eq!(router.connection_count("alice").await, 0);
    drop(rx);

    // A connection whose receiver dropped without a leave is pruned on the
    // next publish; the notification is still stored.
    let (dead_tx, dead_rx) = mpsc::unbounded_channel();
    router.join("alice", "conn-2", dead_tx).await;
    drop(dead_rx);
    router
        .publish("alice", NotificationKind::Generic, "into the void".to_string())
        .await
        .unwrap();
    assert_eq!(router.connection_count("alice").await, 0);
    assert_eq!(storage.count_unread("alice").await.unwrap(), 1);
}

#[tokio::test]
async fn unread_count_and_mark_read_roundtrip() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;

    service
        .router()
        .publish("alice", NotificationKind::Generic, "one".to_string())
        .await
        .unwrap();
    service
        .router()
        .publish("alice", NotificationKind::Generic, "two".to_string())
        .await
        .unwrap();

    assert_eq!(service.unread_count(&alice).await.unwrap(), 2);
    service.mark_notifications_read(&alice).await.unwrap();
    assert_eq!(service.unread_count(&alice).await.unwrap(), 0);

    let notifications = service.notifications(&alice).await.unwrap();
    assert!(notifications.iter().all(|n| n.read));
}

#[tokio::test]
async fn only_the_recipient_deletes_a_notification() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;

    let notification = service
        .router()
        .publish("alice", NotificationKind::Generic, "private".to_string())
        .await
        .unwrap();

    let result = service.delete_notification(&bob, &notification.id).await;
    assert!(matches!(result, Err(SplitsyncError::Unauthorized(_))));

    service
        .delete_notification(&alice, &notification.id)
        .await
        .unwrap();
    assert!(service.notifications(&alice).await.unwrap().is_empty());

    let result = service.delete_notification(&alice, &notification.id).await;
    assert!(matches!(result, Err(SplitsyncError::NotificationNotFound(_))));
}
