pub mod cache_keys;
pub mod in_memory;

use async_trait::async_trait;

use crate::core::errors::SplitsyncError;
use crate::core::models::GroupBalance;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_group_balances(
        &self,
        group_id: &str,
    ) -> Result<Option<Vec<GroupBalance>>, SplitsyncError>;
    async fn save_group_balances(
        &self,
        group_id: &str,
        balances: &[GroupBalance],
        ttl: std::time::Duration,
    ) -> Result<(), SplitsyncError>;
    async fn invalidate_group_balances(&self, group_id: &str) -> Result<(), SplitsyncError>;
}
