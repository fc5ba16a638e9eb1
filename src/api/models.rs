use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::models::{Notification, SettlementMode, SplitPolicy};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    pub member_ids: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInput {
    pub user_id: String,
    #[schema(value_type = Option<f64>, example = 30.0)]
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<f64>, example = 33.4)]
    pub percentage: Option<Decimal>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddExpenseRequest {
    pub description: String,
    #[schema(value_type = f64, example = 90.0)]
    pub amount: Decimal,
    pub category: String,
    pub paid_by: String,
    pub split_type: SplitPolicy,
    /// Only the included participants; members left out of the split are
    /// simply not listed.
    pub participants: Vec<ParticipantInput>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub group_id: String,
    pub payer: String,
    pub payee: String,
    #[schema(value_type = f64, example = 30.0)]
    pub amount: Decimal,
    /// Always the literal "settle".
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub mode: SettlementMode,
    #[serde(default)]
    pub expense_ids: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
