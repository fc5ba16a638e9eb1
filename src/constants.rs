use rust_decimal::Decimal;

/// Maximum drift tolerated between a sum of shares and an expense total,
/// and between a settlement amount and the outstanding edge (0.01).
pub const SPLIT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum drift tolerated between a sum of percentage weights and 100 (0.1).
pub const PERCENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

pub const PERCENT_BASE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Attempts for a ledger compare-and-swap before surfacing
/// `ConcurrentModification` to the caller.
pub const LEDGER_CAS_RETRIES: u32 = 3;

// Audit/log action names.
pub const USER_ADDED: &str = "USER_ADDED";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
pub const SETTLEMENT_PROPOSED: &str = "SETTLEMENT_PROPOSED";
pub const SETTLEMENT_APPROVED: &str = "SETTLEMENT_APPROVED";
pub const SETTLEMENT_REJECTED: &str = "SETTLEMENT_REJECTED";
pub const BALANCES_QUERIED: &str = "BALANCES_QUERIED";
pub const PENDING_SETTLEMENTS_QUERIED: &str = "PENDING_SETTLEMENTS_QUERIED";
pub const NOTIFICATIONS_MARKED_READ: &str = "NOTIFICATIONS_MARKED_READ";
pub const NOTIFICATION_DELETED: &str = "NOTIFICATION_DELETED";
