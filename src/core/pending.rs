use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::models::{Notification, NotificationKind};

/// One settlement awaiting this user's approve/reject decision.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettlementPrompt {
    pub settlement_id: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

/// Ordered queue of offline-settlement decisions for a single session.
/// Exactly one prompt (the head) is surfaced at a time; arrivals append to
/// the tail so decisions happen strictly in arrival order, whatever order
/// the server resolves other requests in.
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: VecDeque<SettlementPrompt>,
}

impl PendingQueue {
    pub fn new() -> Self {
        PendingQueue {
            items: VecDeque::new(),
        }
    }

    /// Appends the prompt carried by an offline-settlement notification.
    /// Other kinds and settlements already queued are ignored. Returns true
    /// when the queue head changed.
    pub fn push(&mut self, notification: &Notification) -> bool {
        let NotificationKind::OfflineSettlement { settlement_id } = &notification.kind else {
            return false;
        };
        if self.items.iter().any(|p| &p.settlement_id == settlement_id) {
            return false;
        }
        self.items.push_back(SettlementPrompt {
            settlement_id: settlement_id.clone(),
            message: notification.message.clone(),
            received_at: notification.created_at,
        });
        self.items.len() == 1
    }

    /// Drops the prompt for a resolved settlement wherever it sits. Returns
    /// true when the head changed (resolved head, or queue drained).
    pub fn resolve(&mut self, settlement_id: &str) -> bool {
        let Some(pos) = self
            .items
            .iter()
            .position(|p| p.settlement_id == settlement_id)
        else {
            return false;
        };
        self.items.remove(pos);
        pos == 0
    }

    pub fn head(&self) -> Option<&SettlementPrompt> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
