use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::constants::{PERCENT_BASE, PERCENT_TOLERANCE, SPLIT_TOLERANCE};
use crate::core::errors::SplitsyncError;
use crate::core::models::{ParticipantShare, SplitPolicy};

/// Raw per-participant input as submitted with an expense. `amount` is only
/// meaningful for the exact policy and `percentage` for the percentage
/// policy; both are ignored otherwise.
#[derive(Clone, Debug)]
pub struct ShareInput {
    pub user_id: String,
    pub included: bool,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
}

impl ShareInput {
    pub fn included(user_id: impl Into<String>) -> Self {
        ShareInput {
            user_id: user_id.into(),
            included: true,
            amount: None,
            percentage: None,
        }
    }
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Turns a raw expense into per-participant owed amounts. Pure computation,
/// no I/O; persistence of the resulting shares is the caller's job.
///
/// Equal shares are rounded per participant and the rounding remainder is
/// not redistributed, so the sum of shares may drift from the total by up to
/// 0.01 per additional participant. Balance comparisons must therefore use
/// the shared tolerance instead of exact equality.
pub fn compute_shares(
    total: Decimal,
    policy: SplitPolicy,
    participants: &[ShareInput],
) -> Result<Vec<ParticipantShare>, SplitsyncError> {
    if total <= Decimal::ZERO {
        return Err(SplitsyncError::Validation(format!(
            "total must be positive, got {}",
            total
        )));
    }

    let included: Vec<&ShareInput> = participants.iter().filter(|p| p.included).collect();
    if included.is_empty() {
        return Err(SplitsyncError::Validation(
            "at least one participant must be included".to_string(),
        ));
    }

    let shares = match policy {
        SplitPolicy::Equal => {
            let head_count = Decimal::from(included.len() as u64);
            let share = round_money(total / head_count);
            participants
                .iter()
                .map(|p| ParticipantShare {
                    user_id: p.user_id.clone(),
                    included: p.included,
                    owed: if p.included { share } else { Decimal::ZERO },
                    percentage: None,
                })
                .collect()
        }
        SplitPolicy::Exact => {
            let mut sum = Decimal::ZERO;
            for p in &included {
                let amount = p.amount.ok_or_else(|| {
                    SplitsyncError::Validation(format!(
                        "participant {} is missing an exact amount",
                        p.user_id
                    ))
                })?;
                if amount < Decimal::ZERO {
                    return Err(SplitsyncError::Validation(format!(
                        "exact amount for {} must not be negative",
                        p.user_id
                    )));
                }
                sum += amount;
            }
            let delta = sum - total;
            if delta.abs() > SPLIT_TOLERANCE {
                return Err(SplitsyncError::SplitMismatch { delta });
            }
            participants
                .iter()
                .map(|p| ParticipantShare {
                    user_id: p.user_id.clone(),
                    included: p.included,
                    owed: if p.included {
                        round_money(p.amount.unwrap_or(Decimal::ZERO))
                    } else {
                        Decimal::ZERO
                    },
                    percentage: None,
                })
                .collect()
        }
        SplitPolicy::Percentage => {
            let mut sum = Decimal::ZERO;
            for p in &included {
                let weight = p.percentage.ok_or_else(|| {
                    SplitsyncError::Validation(format!(
                        "participant {} is missing a percentage weight",
                        p.user_id
                    ))
                })?;
                if weight < Decimal::ZERO || weight > PERCENT_BASE {
                    return Err(SplitsyncError::Validation(format!(
                        "percentage weight for {} must be within [0, 100], got {}",
                        p.user_id, weight
                    )));
                }
                sum += weight;
            }
            let delta = sum - PERCENT_BASE;
            if delta.abs() > PERCENT_TOLERANCE {
                return Err(SplitsyncError::PercentageMismatch { delta });
            }
            participants
                .iter()
                .map(|p| ParticipantShare {
                    user_id: p.user_id.clone(),
                    included: p.included,
                    owed: if p.included {
                        round_money(total * p.percentage.unwrap_or(Decimal::ZERO) / PERCENT_BASE)
                    } else {
                        Decimal::ZERO
                    },
                    percentage: if p.included { p.percentage } else { None },
                })
                .collect()
        }
    };

    debug!(?policy, %total, count = participants.len(), "shares computed");
    Ok(shares)
}
