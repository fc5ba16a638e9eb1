pub mod audit;
pub mod balance;
pub mod expense;
pub mod group;
pub mod notification;
pub mod settlement;
pub mod user;

pub use audit::{AppLog, GroupAudit};
pub use balance::{BalanceEdge, GroupBalance};
pub use expense::{Expense, ParticipantShare, SettlementOutcome, SplitPolicy};
pub use group::{Group, GroupMember, Role};
pub use notification::{Notification, NotificationKind};
pub use settlement::{SettlementMode, SettlementRequest, SettlementStatus};
pub use user::User;
