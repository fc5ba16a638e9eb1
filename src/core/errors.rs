use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Serialize)]
pub enum SplitsyncError {
    /// Malformed input: non-positive total, empty participant set, missing
    /// per-policy data, out-of-range weight.
    #[error("Invalid expense input: {0}")]
    Validation(String),

    /// Exact shares do not add up to the expense total; `delta` is
    /// `sum - total`.
    #[error("Split amounts differ from total by {delta}")]
    SplitMismatch { delta: Decimal },

    /// Percentage weights do not add up to 100; `delta` is `sum - 100`.
    #[error("Percentage weights differ from 100 by {delta}")]
    PercentageMismatch { delta: Decimal },

    /// Settlement amount is non-positive or exceeds the outstanding balance.
    #[error("Invalid settlement amount: {0}")]
    InvalidAmount(String),

    /// The settlement request already reached a terminal state; no further
    /// transition exists.
    #[error("Settlement {0} already resolved")]
    AlreadyResolved(String),

    /// Wrong actor for the requested resolution.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// A ledger compare-and-swap lost the race; retryable with a fresh read.
    #[error("Balance changed concurrently, retry")]
    ConcurrentModification,

    #[error("Cannot create settlement to self")]
    SelfSettlement,

    #[error("User {0} is not a group member")]
    NotGroupMember(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Group {0} not found")]
    GroupNotFound(String),

    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    #[error("Settlement {0} not found")]
    SettlementNotFound(String),

    #[error("Notification {0} not found")]
    NotificationNotFound(String),

    #[error("Email is required")]
    MissingEmail,

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}
