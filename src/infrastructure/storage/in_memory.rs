use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::core::errors::SplitsyncError;
use crate::core::models::{
    BalanceEdge, Expense, Group, GroupAudit, Notification, SettlementRequest, SettlementStatus,
    User,
};
use crate::infrastructure::storage::Storage;

/// Edges are stored once per unordered member pair.
fn edge_key(group_id: &str, a: &str, b: &str) -> (String, String, String) {
    if a <= b {
        (group_id.to_string(), a.to_string(), b.to_string())
    } else {
        (group_id.to_string(), b.to_string(), a.to_string())
    }
}

pub struct InMemoryStorage {
    users: Mutex<HashMap<String, User>>,
    emails: Mutex<HashMap<String, String>>, // email -> user_id
    groups: Mutex<HashMap<String, Group>>,
    expenses: Mutex<HashMap<String, Expense>>,
    edges: Mutex<HashMap<(String, String, String), BalanceEdge>>,
    settlements: Mutex<HashMap<String, SettlementRequest>>,
    notifications: Mutex<HashMap<String, Notification>>,
    group_audits: Mutex<HashMap<String, Vec<GroupAudit>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            users: Mutex::new(HashMap::new()),
            emails: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            expenses: Mutex::new(HashMap::new()),
            edges: Mutex::new(HashMap::new()),
            settlements: Mutex::new(HashMap::new()),
            notifications: Mutex::new(HashMap::new()),
            group_audits: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user_if_not_exists(&self, user: User) -> Result<User, SplitsyncError> {
        let mut emails = self.emails.lock().await;
        if emails.contains_key(&user.email) {
            return Err(SplitsyncError::EmailAlreadyRegistered(user.email));
        }
        emails.insert(user.email.clone(), user.id.clone());
        let mut users = self.users.lock().await;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SplitsyncError> {
        Ok(self.users.lock().await.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SplitsyncError> {
        // For production: database index on email
        let user_id = self.emails.lock().await.get(email).cloned();
        Ok(match user_id {
            Some(id) => self.users.lock().await.get(&id).cloned(),
            None => None,
        })
    }

    async fn save_group(&self, group: Group) -> Result<(), SplitsyncError> {
        self.groups.lock().await.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, SplitsyncError> {
        Ok(self.groups.lock().await.get(group_id).cloned())
    }

    async fn is_group_member(&self, group_id: &str, user_id: &str) -> Result<bool, SplitsyncError> {
        Ok(self
            .groups
            .lock()
            .await
            .get(group_id)
            .map(|g| g.is_member(user_id))
            .unwrap_or(false))
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), SplitsyncError> {
        self.expenses
            .lock()
            .await
            .insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, SplitsyncError> {
        Ok(self.expenses.lock().await.get(expense_id).cloned())
    }

    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, SplitsyncError> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .lock()
            .await
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        expenses.sort_by_key(|e| e.created_at);
        Ok(expenses)
    }

    async fn get_balance_edge(
        &self,
        group_id: &str,
        a: &str,
        b: &str,
    ) -> Result<Option<BalanceEdge>, SplitsyncError> {
        let key = edge_key(group_id, a, b);
        Ok(self.edges.lock().await.get(&key).cloned())
    }

    async fn put_balance_edge(
        &self,
        edge: BalanceEdge,
        expected_version: Option<u64>,
    ) -> Result<BalanceEdge, SplitsyncError> {
        let key = edge_key(&edge.group_id, &edge.debtor_id, &edge.creditor_id);
        let mut edges = self.edges.lock().await;
        match (edges.get(&key), expected_version) {
            (None, None) => {
                let stored = BalanceEdge { version: 0, ..edge };
                edges.insert(key, stored.clone());
                Ok(stored)
            }
            (Some(current), Some(v)) if current.version == v => {
                let stored = BalanceEdge {
                    version: v + 1,
                    ..edge
                };
                edges.insert(key, stored.clone());
                Ok(stored)
            }
            _ => Err(SplitsyncError::ConcurrentModification),
        }
    }

    async fn list_balance_edges(&self, group_id: &str) -> Result<Vec<BalanceEdge>, SplitsyncError> {
        let mut edges: Vec<BalanceEdge> = self
            .edges
            .lock()
            .await
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        edges.sort_by(|a, b| (&a.debtor_id, &a.creditor_id).cmp(&(&b.debtor_id, &b.creditor_id)));
        Ok(edges)
    }

    async fn save_settlement(&self, settlement: SettlementRequest) -> Result<(), SplitsyncError> {
        self.settlements
            .lock()
            .await
            .insert(settlement.id.clone(), settlement);
        Ok(())
    }

    async fn get_settlement(
        &self,
        settlement_id: &str,
    ) -> Result<Option<SettlementRequest>, SplitsyncError> {
        Ok(self.settlements.lock().await.get(settlement_id).cloned())
    }

    async fn mark_settlement_resolved(
        &self,
        settlement_id: &str,
        status: SettlementStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<SettlementRequest, SplitsyncError> {
        let mut settlements = self.settlements.lock().await;
        let settlement = settlements
            .get_mut(settlement_id)
            .ok_or_else(|| SplitsyncError::SettlementNotFound(settlement_id.to_string()))?;
        if settlement.is_terminal() {
            return Err(SplitsyncError::AlreadyResolved(settlement_id.to_string()));
        }
        settlement.status = status;
        settlement.resolved_at = Some(resolved_at);
        Ok(settlement.clone())
    }

    async fn get_pending_settlements_for(
        &self,
        payee_id: &str,
    ) -> Result<Vec<SettlementRequest>, SplitsyncError> {
        let mut pending: Vec<SettlementRequest> = self
            .settlements
            .lock()
            .await
            .values()
            .filter(|s| s.payee_id == payee_id && !s.is_terminal())
            .cloned()
            .collect();
        pending.sort_by_key(|s| s.created_at);
        Ok(pending)
    }

    async fn save_notification(&self, notification: Notification) -> Result<(), SplitsyncError> {
        self.notifications
            .lock()
            .await
            .insert(notification.id.clone(), notification);
        Ok(())
    }

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, SplitsyncError> {
        Ok(self.notifications.lock().await.get(id).cloned())
    }

    async fn get_notifications(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<Notification>, SplitsyncError> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .lock()
            .await
            .values()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn count_unread(&self, recipient_id: &str) -> Result<usize, SplitsyncError> {
        Ok(self
            .notifications
            .lock()
            .await
            .values()
            .filter(|n| n.recipient_id == recipient_id && !n.read)
            .count())
    }

    async fn mark_all_read(&self, recipient_id: &str) -> Result<(), SplitsyncError> {
        let mut notifications = self.notifications.lock().await;
        for notification in notifications.values_mut() {
            if notification.recipient_id == recipient_id {
                notification.read = true;
            }
        }
        Ok(())
    }

    async fn delete_notification(&self, id: &str) -> Result<(), SplitsyncError> {
        self.notifications
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SplitsyncError::NotificationNotFound(id.to_string()))
    }

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), SplitsyncError> {
        let mut audits = self.group_audits.lock().await;
        audits.entry(audit.group_id.clone()).or_default().push(audit);
        Ok(())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, SplitsyncError> {
        Ok(self
            .group_audits
            .lock()
            .await
            .get(group_id)
            .cloned()
            .unwrap_or_default())
    }
}
