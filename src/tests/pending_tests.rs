use chrono::Utc;
use uuid::Uuid;

use crate::core::models::{Notification, NotificationKind};
use crate::core::pending::PendingQueue;

fn offline_settlement(settlement_id: &str, message: &str) -> Notification {
    Notification {
        id: Uuid::new_v4().to_string(),
        recipient_id: "alice".to_string(),
        kind: NotificationKind::OfflineSettlement {
            settlement_id: settlement_id.to_string(),
        },
        message: message.to_string(),
        read: false,
        created_at: Utc::now(),
    }
}

fn generic(message: &str) -> Notification {
    Notification {
        id: Uuid::new_v4().to_string(),
        recipient_id: "alice".to_string(),
        kind: NotificationKind::Generic,
        message: message.to_string(),
        read: false,
        created_at: Utc::now(),
    }
}

#[test]
fn prompts_surface_in_arrival_order() {
    let mut queue = PendingQueue::new();
    assert!(queue.push(&offline_settlement("s1", "first")));
    // A prompt already open: later arrivals go to the tail.
    assert!(!queue.push(&offline_settlement("s2", "second")));
    assert!(!queue.push(&offline_settlement("s3", "third")));

    assert_eq!(queue.len(), 3);
    assert_eq!(queue.head().unwrap().settlement_id, "s1");

    assert!(queue.resolve("s1"));
    assert_eq!(queue.head().unwrap().settlement_id, "s2");
    assert!(queue.resolve("s2"));
    assert!(queue.resolve("s3"));
    assert!(queue.is_empty());
    assert!(queue.head().is_none());
}

#[test]
fn resolving_a_non_head_item_keeps_the_prompt_open() {
    let mut queue = PendingQueue::new();
    queue.push(&offline_settlement("s1", "first"));
    queue.push(&offline_settlement("s2", "second"));

    // The server resolved s2 out of band; the open prompt is unaffected.
    assert!(!queue.resolve("s2"));
    assert_eq!(queue.head().unwrap().settlement_id, "s1");
    assert_eq!(queue.len(), 1);
}

#[test]
fn duplicate_settlements_are_queued_once() {
    let mut queue = PendingQueue::new();
    queue.push(&offline_settlement("s1", "first"));
    assert!(!queue.push(&offline_settlement("s1", "first again")));
    assert_eq!(queue.len(), 1);
}

#[test]
fn generic_notifications_are_not_queued() {
    let mut queue = PendingQueue::new();
    assert!(!queue.push(&generic("toast")));
    assert!(queue.is_empty());
}

#[test]
fn resolving_an_unknown_settlement_is_a_no_op() {
    let mut queue = PendingQueue::new();
    queue.push(&offline_settlement("s1", "first"));
    assert!(!queue.resolve("missing"));
    assert_eq!(queue.len(), 1);
}
