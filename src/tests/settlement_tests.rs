use rust_decimal::Decimal;

use super::{create_test_service, money, seed_group, seed_user};
use crate::core::errors::SplitsyncError;
use crate::core::models::{
    NotificationKind, SettlementMode, SettlementStatus, SplitPolicy,
};
use crate::core::service::{Actor, Decision};
use crate::core::split::ShareInput;
use crate::infrastructure::storage::Storage;

#[tokio::test]
async fn equal_split_expense_builds_balance_edges() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let carol = seed_user(&service, "carol", "Carol").await;
    let group = seed_group(&service, "Trip", &[&alice, &bob, &carol]).await;

    service
        .add_expense(
            &group.id,
            "Dinner".to_string(),
            money(90_00),
            "Food".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![
                ShareInput::included("alice"),
                ShareInput::included("bob"),
                ShareInput::included("carol"),
            ],
            &alice,
        )
        .await
        .unwrap();

    let storage = service.storage();
    let bob_edge = storage
        .get_balance_edge(&group.id, "bob", "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bob_edge.debtor_id, "bob");
    assert_eq!(bob_edge.amount, money(30_00));

    let balances = service.group_balances(&group.id, &alice).await.unwrap();
    assert_eq!(balances.len(), 2);
    assert!(balances.iter().all(|b| b.to == "alice" && b.amount == money(30_00)));
}

#[tokio::test]
async fn settle_end_to_end_offline() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let carol = seed_user(&service, "carol", "Carol").await;
    let group = seed_group(&service, "Trip", &[&alice, &bob, &carol]).await;

    service
        .add_expense(
            &group.id,
            "Dinner".to_string(),
            money(90_00),
            "Food".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![
                ShareInput::included("alice"),
                ShareInput::included("bob"),
                ShareInput::included("carol"),
            ],
            &alice,
        )
        .await
        .unwrap();

    let settlement = service
        .propose_settlement(
            &group.id,
            &bob,
            "alice",
            money(30_00),
            SettlementMode::Offline,
            None,
        )
        .await
        .unwrap();
    assert_eq!(settlement.status, SettlementStatus::Pending);

    // The payee received the actionable notification carrying the id.
    let alice_notifications = service.notifications(&alice).await.unwrap();
    assert!(alice_notifications.iter().any(|n| {
        n.kind
            == NotificationKind::OfflineSettlement {
                settlement_id: settlement.id.clone(),
            }
    }));

    // Oldest-first pending list for the payee.
    let pending = service.pending_settlements(&alice).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, settlement.id);

    let resolved = service
        .resolve_settlement(&settlement.id, Actor::User(&alice), Decision::Approve)
        .await
        .unwrap();
    assert_eq!(resolved.status, SettlementStatus::Approved);
    assert!(resolved.resolved_at.is_some());

    let edge = service
        .storage()
        .get_balance_edge(&group.id, "bob", "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edge.amount, Decimal::ZERO);

    // Both parties hear about the resolution.
    for user in [&bob, &alice] {
        let resolved_notification = service
            .notifications(user)
            .await
            .unwrap()
            .into_iter()
            .find(|n| {
                n.kind
                    == NotificationKind::SettlementResolved {
                        settlement_id: settlement.id.clone(),
                        approved: true,
                    }
            });
        assert!(resolved_notification.is_some(), "missing for {}", user.id);
    }

    assert!(service.pending_settlements(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn resolve_is_idempotent_and_never_double_applies() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let group = seed_group(&service, "Flat", &[&alice, &bob]).await;

    service
        .add_expense(
            &group.id,
            "Rent".to_string(),
            money(60_00),
            "Utilities".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![ShareInput::included("alice"), ShareInput::included("bob")],
            &alice,
        )
        .await
        .unwrap();

    let settlement = service
        .propose_settlement(&group.id, &bob, "alice", money(30_00), SettlementMode::Offline, None)
        .await
        .unwrap();

    service
        .resolve_settlement(&settlement.id, Actor::User(&alice), Decision::Approve)
        .await
        .unwrap();
    let second = service
        .resolve_settlement(&settlement.id, Actor::User(&alice), Decision::Approve)
        .await;
    assert!(matches!(second, Err(SplitsyncError::AlreadyResolved(_))));

    let edge = service
        .storage()
        .get_balance_edge(&group.id, "bob", "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edge.amount, Decimal::ZERO);
}

#[tokio::test]
async fn proposal_exceeding_outstanding_balance_fails() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let group = seed_group(&service, "Flat", &[&alice, &bob]).await;

    service
        .add_expense(
            &group.id,
            "Groceries".to_string(),
            money(60_00),
            "Groceries".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![ShareInput::included("alice"), ShareInput::included("bob")],
            &alice,
        )
        .await
        .unwrap();

    let result = service
        .propose_settlement(&group.id, &bob, "alice", money(50_00), SettlementMode::Offline, None)
        .await;
    assert!(matches!(result, Err(SplitsyncError::InvalidAmount(_))));

    let result = service
        .propose_settlement(&group.id, &bob, "alice", Decimal::ZERO, SettlementMode::Offline, None)
        .await;
    assert!(matches!(result, Err(SplitsyncError::InvalidAmount(_))));
}

#[tokio::test]
async fn later_resolution_reads_post_resolution_edge() {
    // Two pending requests for the same pair; the second approval must fail
    // instead of driving the edge negative.
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let group = seed_group(&service, "Flat", &[&alice, &bob]).await;

    service
        .add_expense(
            &group.id,
            "Internet".to_string(),
            money(60_00),
            "Utilities".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![ShareInput::included("alice"), ShareInput::included("bob")],
            &alice,
        )
        .await
        .unwrap();

    let first = service
        .propose_settlement(&group.id, &bob, "alice", money(30_00), SettlementMode::Offline, None)
        .await
        .unwrap();
    let second = service
        .propose_settlement(&group.id, &bob, "alice", money(30_00), SettlementMode::Offline, None)
        .await
        .unwrap();

    service
        .resolve_settlement(&first.id, Actor::User(&alice), Decision::Approve)
        .await
        .unwrap();
    let result = service
        .resolve_settlement(&second.id, Actor::User(&alice), Decision::Approve)
        .await;
    assert!(matches!(result, Err(SplitsyncError::InvalidAmount(_))));

    // The losing request is still pending, not silently dropped.
    let still_pending = service
        .storage()
        .get_settlement(&second.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(still_pending.status, SettlementStatus::Pending);

    let edge = service
        .storage()
        .get_balance_edge(&group.id, "bob", "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edge.amount, Decimal::ZERO);
}

#[tokio::test]
async fn only_the_payee_resolves_offline_requests() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let carol = seed_user(&service, "carol", "Carol").await;
    let group = seed_group(&service, "Trip", &[&alice, &bob, &carol]).await;

    service
        .add_expense(
            &group.id,
            "Taxi".to_string(),
            money(40_00),
            "Travel".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![ShareInput::included("alice"), ShareInput::included("bob")],
            &alice,
        )
        .await
        .unwrap();

    let settlement = service
        .propose_settlement(&group.id, &bob, "alice", money(20_00), SettlementMode::Offline, None)
        .await
        .unwrap();

    for wrong_actor in [&bob, &carol] {
        let result = service
            .resolve_settlement(&settlement.id, Actor::User(wrong_actor), Decision::Approve)
            .await;
        assert!(matches!(result, Err(SplitsyncError::Unauthorized(_))));
    }
    let result = service
        .resolve_settlement(&settlement.id, Actor::PaymentCapture, Decision::Approve)
        .await;
    assert!(matches!(result, Err(SplitsyncError::Unauthorized(_))));
}

#[tokio::test]
async fn reject_leaves_the_ledger_untouched() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let group = seed_group(&service, "Flat", &[&alice, &bob]).await;

    service
        .add_expense(
            &group.id,
            "Heating".to_string(),
            money(60_00),
            "Utilities".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![ShareInput::included("alice"), ShareInput::included("bob")],
            &alice,
        )
        .await
        .unwrap();

    let settlement = service
        .propose_settlement(&group.id, &bob, "alice", money(30_00), SettlementMode::Offline, None)
        .await
        .unwrap();
    let resolved = service
        .resolve_settlement(&settlement.id, Actor::User(&alice), Decision::Reject)
        .await
        .unwrap();
    assert_eq!(resolved.status, SettlementStatus::Rejected);

    let edge = service
        .storage()
        .get_balance_edge(&group.id, "bob", "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edge.amount, money(30_00));

    let rejected_notice = service
        .notifications(&bob)
        .await
        .unwrap()
        .into_iter()
        .find(|n| {
            n.kind
                == NotificationKind::SettlementResolved {
                    settlement_id: settlement.id.clone(),
                    approved: false,
                }
        });
    assert!(rejected_notice.is_some());
}

#[tokio::test]
async fn online_requests_resolve_only_on_capture() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let group = seed_group(&service, "Flat", &[&alice, &bob]).await;

    service
        .add_expense(
            &group.id,
            "Deposit".to_string(),
            money(100_00),
            "Others".to_string(),
            &alice.id,
            SplitPolicy::Exact,
            vec![
                ShareInput {
                    amount: Some(money(40_00)),
                    ..ShareInput::included("alice")
                },
                ShareInput {
                    amount: Some(money(60_00)),
                    ..ShareInput::included("bob")
                },
            ],
            &alice,
        )
        .await
        .unwrap();

    let settlement = service
        .propose_settlement(&group.id, &bob, "alice", money(60_00), SettlementMode::Online, None)
        .await
        .unwrap();

    // The payee cannot short-circuit an online request, and a capture can
    // only ever approve.
    let result = service
        .resolve_settlement(&settlement.id, Actor::User(&alice), Decision::Approve)
        .await;
    assert!(matches!(result, Err(SplitsyncError::Unauthorized(_))));
    let result = service
        .resolve_settlement(&settlement.id, Actor::PaymentCapture, Decision::Reject)
        .await;
    assert!(matches!(result, Err(SplitsyncError::Unauthorized(_))));

    // A failed capture never calls resolve, so the request is still pending.
    let pending = service
        .storage()
        .get_settlement(&settlement.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.status, SettlementStatus::Pending);

    let resolved = service
        .resolve_settlement(&settlement.id, Actor::PaymentCapture, Decision::Approve)
        .await
        .unwrap();
    assert_eq!(resolved.status, SettlementStatus::Approved);

    let edge = service
        .storage()
        .get_balance_edge(&group.id, "bob", "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edge.amount, Decimal::ZERO);
}

#[tokio::test]
async fn approved_settlement_marks_covered_expenses() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let group = seed_group(&service, "Flat", &[&alice, &bob]).await;

    let expense = service
        .add_expense(
            &group.id,
            "Cleaning".to_string(),
            money(30_00),
            "Utilities".to_string(),
            &alice.id,
            SplitPolicy::Exact,
            vec![ShareInput {
                amount: Some(money(30_00)),
                ..ShareInput::included("bob")
            }],
            &alice,
        )
        .await
        .unwrap();

    let settlement = service
        .propose_settlement(
            &group.id,
            &bob,
            "alice",
            money(30_00),
            SettlementMode::Offline,
            Some(vec![expense.id.clone()]),
        )
        .await
        .unwrap();
    service
        .resolve_settlement(&settlement.id, Actor::User(&alice), Decision::Approve)
        .await
        .unwrap();

    let settled = service
        .storage()
        .get_expense(&expense.id)
        .await
        .unwrap()
        .unwrap();
    let outcome = settled.settlement.expect("expense should carry the outcome");
    assert_eq!(outcome.settlement_id, settlement.id);
    assert_eq!(outcome.amount, money(30_00));
    assert_eq!(outcome.payer_name, "Bob");
    assert_eq!(outcome.payee_name, "Alice");
    assert_eq!(outcome.mode, SettlementMode::Offline);
}

#[tokio::test]
async fn counter_expense_repoints_the_edge() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let group = seed_group(&service, "Flat", &[&alice, &bob]).await;

    // Bob ends up owing Alice 30.
    service
        .add_expense(
            &group.id,
            "Dinner".to_string(),
            money(60_00),
            "Food".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![ShareInput::included("alice"), ShareInput::included("bob")],
            &alice,
        )
        .await
        .unwrap();
    // Alice now owes Bob 50; the net flips to Alice owing 20.
    service
        .add_expense(
            &group.id,
            "Concert tickets".to_string(),
            money(100_00),
            "Entertainment".to_string(),
            &bob.id,
            SplitPolicy::Exact,
            vec![
                ShareInput {
                    amount: Some(money(50_00)),
                    ..ShareInput::included("alice")
                },
                ShareInput {
                    amount: Some(money(50_00)),
                    ..ShareInput::included("bob")
                },
            ],
            &bob,
        )
        .await
        .unwrap();

    let edge = service
        .storage()
        .get_balance_edge(&group.id, "alice", "bob")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edge.debtor_id, "alice");
    assert_eq!(edge.creditor_id, "bob");
    assert_eq!(edge.amount, money(20_00));
}

#[tokio::test]
async fn split_invariants_are_enforced_server_side() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let group = seed_group(&service, "Flat", &[&alice, &bob]).await;

    // Whatever the client precomputed, a mismatching exact split is refused.
    let result = service
        .add_expense(
            &group.id,
            "Dinner".to_string(),
            money(100_00),
            "Food".to_string(),
            &alice.id,
            SplitPolicy::Exact,
            vec![
                ShareInput {
                    amount: Some(money(33_00)),
                    ..ShareInput::included("alice")
                },
                ShareInput {
                    amount: Some(money(33_00)),
                    ..ShareInput::included("bob")
                },
            ],
            &alice,
        )
        .await;
    assert!(matches!(result, Err(SplitsyncError::SplitMismatch { .. })));

    // Outsiders cannot appear in a split.
    let outsider = seed_user(&service, "mallory", "Mallory").await;
    let result = service
        .add_expense(
            &group.id,
            "Dinner".to_string(),
            money(10_00),
            "Food".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![ShareInput::included(outsider.id.as_str())],
            &alice,
        )
        .await;
    assert!(matches!(result, Err(SplitsyncError::NotGroupMember(_))));

    let result = service
        .propose_settlement(&group.id, &alice, "alice", money(1_00), SettlementMode::Offline, None)
        .await;
    assert!(matches!(result, Err(SplitsyncError::SelfSettlement)));
}

#[tokio::test]
async fn reconnect_recovers_the_prompt_head_from_storage() {
    let service = create_test_service();
    let alice = seed_user(&service, "alice", "Alice").await;
    let bob = seed_user(&service, "bob", "Bob").await;
    let group = seed_group(&service, "Flat", &[&alice, &bob]).await;

    service
        .add_expense(
            &group.id,
            "Water".to_string(),
            money(20_00),
            "Utilities".to_string(),
            &alice.id,
            SplitPolicy::Equal,
            vec![ShareInput::included("alice"), ShareInput::included("bob")],
            &alice,
        )
        .await
        .unwrap();

    // Nobody is connected when the proposal lands; the event is missed.
    let settlement = service
        .propose_settlement(&group.id, &bob, "alice", money(10_00), SettlementMode::Offline, None)
        .await
        .unwrap();

    // A fresh session rebuilds its queue from unread notifications alone,
    // exactly like the websocket join path does.
    let mut queue = crate::core::pending::PendingQueue::new();
    let notifications = service.notifications(&alice).await.unwrap();
    for notification in notifications.iter().rev().filter(|n| !n.read) {
        queue.push(notification);
    }
    assert_eq!(queue.head().unwrap().settlement_id, settlement.id);
    assert_eq!(service.unread_count(&alice).await.unwrap(), 1);

    let pending = service.pending_settlements(&alice).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, settlement.id);
}
