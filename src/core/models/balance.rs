use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Net outstanding amount the debtor owes the creditor within a group.
/// Stored once per member pair; the amount is never negative in the stored
/// direction — a debt that overshoots it re-points the edge instead. The
/// version column backs the compare-and-swap write discipline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceEdge {
    pub group_id: String,
    pub debtor_id: String,
    pub creditor_id: String,
    pub amount: Decimal,
    pub version: u64,
}

impl BalanceEdge {
    /// Outstanding amount in the `debtor -> creditor` direction; zero when
    /// the edge points the other way.
    pub fn outstanding_from(&self, debtor_id: &str) -> Decimal {
        if self.debtor_id == debtor_id {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

/// Row of the group balance summary the settle flow starts from.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupBalance {
    pub from: String,
    pub to: String,
    pub from_name: String,
    pub to_name: String,
    #[schema(value_type = String, example = "30.00")]
    pub amount: Decimal,
}
