use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::errors::SplitsyncError;
use crate::core::models::{
    BalanceEdge, Expense, Group, GroupAudit, Notification, SettlementRequest, SettlementStatus,
    User,
};

#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn create_user_if_not_exists(&self, user: User) -> Result<User, SplitsyncError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, SplitsyncError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, SplitsyncError>;

    async fn save_group(&self, group: Group) -> Result<(), SplitsyncError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, SplitsyncError>;
    async fn is_group_member(&self, group_id: &str, user_id: &str) -> Result<bool, SplitsyncError>;

    async fn save_expense(&self, expense: Expense) -> Result<(), SplitsyncError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, SplitsyncError>;
    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, SplitsyncError>;

    /// The edge between two members, whichever direction it currently points.
    async fn get_balance_edge(
        &self,
        group_id: &str,
        a: &str,
        b: &str,
    ) -> Result<Option<BalanceEdge>, SplitsyncError>;
    /// Compare-and-swap write. `expected_version` of `None` inserts a new
    /// edge and fails if one exists for the pair; `Some(v)` requires the
    /// stored version to still be `v`. A mismatch either way is
    /// `ConcurrentModification`.
    async fn put_balance_edge(
        &self,
        edge: BalanceEdge,
        expected_version: Option<u64>,
    ) -> Result<BalanceEdge, SplitsyncError>;
    async fn list_balance_edges(&self, group_id: &str) -> Result<Vec<BalanceEdge>, SplitsyncError>;

    async fn save_settlement(&self, settlement: SettlementRequest) -> Result<(), SplitsyncError>;
    async fn get_settlement(
        &self,
        settlement_id: &str,
    ) -> Result<Option<SettlementRequest>, SplitsyncError>;
    /// Atomically flips a pending request to a terminal status. Fails with
    /// `AlreadyResolved` when another actor won the flip.
    async fn mark_settlement_resolved(
        &self,
        settlement_id: &str,
        status: SettlementStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<SettlementRequest, SplitsyncError>;
    /// Requests awaiting this payee's decision, oldest first.
    async fn get_pending_settlements_for(
        &self,
        payee_id: &str,
    ) -> Result<Vec<SettlementRequest>, SplitsyncError>;

    async fn save_notification(&self, notification: Notification) -> Result<(), SplitsyncError>;
    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, SplitsyncError>;
    /// Newest first.
    async fn get_notifications(&self, recipient_id: &str)
        -> Result<Vec<Notification>, SplitsyncError>;
    async fn count_unread(&self, recipient_id: &str) -> Result<usize, SplitsyncError>;
    async fn mark_all_read(&self, recipient_id: &str) -> Result<(), SplitsyncError>;
    async fn delete_notification(&self, id: &str) -> Result<(), SplitsyncError>;

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), SplitsyncError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, SplitsyncError>;
}

pub mod in_memory;
