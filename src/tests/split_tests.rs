use rust_decimal::Decimal;

use super::money;
use crate::constants::SPLIT_TOLERANCE;
use crate::core::errors::SplitsyncError;
use crate::core::models::SplitPolicy;
use crate::core::split::{ShareInput, compute_shares};

fn included(user_id: &str) -> ShareInput {
    ShareInput::included(user_id)
}

fn exact(user_id: &str, cents: i64) -> ShareInput {
    ShareInput {
        amount: Some(money(cents)),
        ..ShareInput::included(user_id)
    }
}

fn weighted(user_id: &str, percentage: Decimal) -> ShareInput {
    ShareInput {
        percentage: Some(percentage),
        ..ShareInput::included(user_id)
    }
}

#[test]
fn equal_split_divides_evenly() {
    let shares = compute_shares(
        money(90_00),
        SplitPolicy::Equal,
        &[included("a"), included("b"), included("c")],
    )
    .unwrap();

    assert_eq!(shares.len(), 3);
    for share in &shares {
        assert!(share.included);
        assert_eq!(share.owed, money(30_00));
        assert_eq!(share.percentage, None);
    }
}

#[test]
fn equal_split_rounding_drift_stays_within_band() {
    // 100.00 / 3 rounds to 33.33 each; the remainder is not redistributed.
    let total = money(100_00);
    let shares = compute_shares(
        total,
        SplitPolicy::Equal,
        &[included("a"), included("b"), included("c")],
    )
    .unwrap();

    let sum: Decimal = shares.iter().map(|s| s.owed).sum();
    assert_eq!(sum, money(99_99));

    let band = SPLIT_TOLERANCE * Decimal::from(shares.len() as u64 - 1);
    assert!((sum - total).abs() <= band);
}

#[test]
fn equal_split_skips_excluded_participants() {
    let mut excluded = ShareInput::included("c");
    excluded.included = false;

    let shares = compute_shares(
        money(50_00),
        SplitPolicy::Equal,
        &[included("a"), included("b"), excluded],
    )
    .unwrap();

    assert_eq!(shares[0].owed, money(25_00));
    assert_eq!(shares[1].owed, money(25_00));
    assert!(!shares[2].included);
    assert_eq!(shares[2].owed, Decimal::ZERO);
}

#[test]
fn exact_split_accepts_matching_amounts() {
    let shares = compute_shares(
        money(100_00),
        SplitPolicy::Exact,
        &[exact("a", 33_33), exact("b", 33_33), exact("c", 33_34)],
    )
    .unwrap();

    assert_eq!(shares[2].owed, money(33_34));
}

#[test]
fn exact_split_reports_delta_on_mismatch() {
    let result = compute_shares(
        money(100_00),
        SplitPolicy::Exact,
        &[exact("a", 33_00), exact("b", 33_00), exact("c", 33_00)],
    );

    match result {
        Err(SplitsyncError::SplitMismatch { delta }) => assert_eq!(delta, money(-1_00)),
        other => panic!("expected SplitMismatch, got {:?}", other),
    }
}

#[test]
fn exact_split_requires_amounts() {
    let result = compute_shares(
        money(10_00),
        SplitPolicy::Exact,
        &[exact("a", 5_00), included("b")],
    );
    assert!(matches!(result, Err(SplitsyncError::Validation(_))));
}

#[test]
fn percentage_split_computes_weighted_shares() {
    let shares = compute_shares(
        money(250_00),
        SplitPolicy::Percentage,
        &[weighted("a", Decimal::from(50)), weighted("b", Decimal::from(50))],
    )
    .unwrap();

    assert_eq!(shares[0].owed, money(125_00));
    assert_eq!(shares[1].owed, money(125_00));
    assert_eq!(shares[0].percentage, Some(Decimal::from(50)));
}

#[test]
fn percentage_split_reports_delta_on_mismatch() {
    let result = compute_shares(
        money(100_00),
        SplitPolicy::Percentage,
        &[
            weighted("a", Decimal::new(498, 1)), // 49.8
            weighted("b", Decimal::from(50)),
        ],
    );

    match result {
        Err(SplitsyncError::PercentageMismatch { delta }) => {
            assert_eq!(delta, Decimal::new(-2, 1))
        }
        other => panic!("expected PercentageMismatch, got {:?}", other),
    }
}

#[test]
fn percentage_split_rejects_out_of_range_weight() {
    let result = compute_shares(
        money(100_00),
        SplitPolicy::Percentage,
        &[weighted("a", Decimal::from(150))],
    );
    assert!(matches!(result, Err(SplitsyncError::Validation(_))));
}

#[test]
fn percentage_weight_sum_within_tolerance_passes() {
    let shares = compute_shares(
        money(100_00),
        SplitPolicy::Percentage,
        &[
            weighted("a", Decimal::new(4995, 2)), // 49.95
            weighted("b", Decimal::from(50)),
        ],
    )
    .unwrap();
    assert_eq!(shares[0].owed, money(49_95));
}

#[test]
fn non_positive_total_is_rejected() {
    let result = compute_shares(Decimal::ZERO, SplitPolicy::Equal, &[included("a")]);
    assert!(matches!(result, Err(SplitsyncError::Validation(_))));
}

#[test]
fn empty_included_set_is_rejected() {
    let mut excluded = ShareInput::included("a");
    excluded.included = false;

    let result = compute_shares(money(10_00), SplitPolicy::Equal, &[excluded]);
    assert!(matches!(result, Err(SplitsyncError::Validation(_))));
}
