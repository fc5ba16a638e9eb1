use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::settlement::SettlementMode;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    Equal,
    Exact,
    Percentage,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantShare {
    pub user_id: String,
    pub included: bool,
    /// Rounded to 2 decimals; zero for excluded participants.
    #[schema(value_type = String, example = "30.00")]
    pub owed: Decimal,
    /// Weight in [0, 100]; only present for the percentage policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "33.4")]
    pub percentage: Option<Decimal>,
}

/// Attached to every expense a settlement covered, once the settlement is
/// approved. Terminal and immutable.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    pub settlement_id: String,
    pub mode: SettlementMode,
    pub payer_name: String,
    pub payee_name: String,
    #[schema(value_type = String, example = "30.00")]
    pub amount: Decimal,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub settled_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub description: String,
    #[schema(value_type = String, example = "90.00")]
    pub amount: Decimal,
    pub category: String,
    pub paid_by: String,
    pub split_policy: SplitPolicy,
    pub shares: Vec<ParticipantShare>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    /// Set once a covering settlement is approved; shares never change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementOutcome>,
}
