pub mod in_memory;

use async_trait::async_trait;

use crate::core::errors::SplitsyncError;
use crate::core::models::AppLog;

#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SplitsyncError>;
    async fn get_logs(&self) -> Result<Vec<AppLog>, SplitsyncError>;
}
