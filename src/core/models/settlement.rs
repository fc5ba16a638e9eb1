use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementMode {
    Offline,
    Online,
}

impl Default for SettlementMode {
    fn default() -> Self {
        SettlementMode::Offline
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    pub id: String,
    pub group_id: String,
    pub payer_id: String,
    pub payee_id: String,
    #[schema(value_type = String, example = "30.00")]
    pub amount: Decimal,
    pub mode: SettlementMode,
    pub status: SettlementStatus,
    /// Expenses this payment covers; they receive the settlement outcome on
    /// approval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_ids: Option<Vec<String>>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "2024-06-01T12:40:00Z")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SettlementRequest {
    pub fn is_terminal(&self) -> bool {
        self.status != SettlementStatus::Pending
    }
}
