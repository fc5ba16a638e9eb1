use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Discriminated notification payload. `offline-settlement` is the only kind
/// a client must act on; everything else renders as a transient toast.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NotificationKind {
    OfflineSettlement {
        #[serde(rename = "settlementId")]
        settlement_id: String,
    },
    SettlementResolved {
        #[serde(rename = "settlementId")]
        settlement_id: String,
        approved: bool,
    },
    Generic,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OfflineSettlement { .. } => "offline-settlement",
            NotificationKind::SettlementResolved { .. } => "settlement-resolved",
            NotificationKind::Generic => "generic",
        }
    }

    pub fn settlement_id(&self) -> Option<&str> {
        match self {
            NotificationKind::OfflineSettlement { settlement_id }
            | NotificationKind::SettlementResolved { settlement_id, .. } => Some(settlement_id),
            NotificationKind::Generic => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub message: String,
    /// Flipped only by the recipient.
    pub read: bool,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}
