pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;
pub mod realtime;

pub use crate::core::errors::SplitsyncError;
pub use crate::core::pending::PendingQueue;
pub use crate::core::service::SplitsyncService;
pub use crate::infrastructure::cache::in_memory::InMemoryCache;
pub use crate::infrastructure::logging::in_memory::InMemoryLogging;
pub use crate::infrastructure::storage::in_memory::InMemoryStorage;
pub use crate::realtime::NotificationRouter;

#[cfg(test)]
mod tests;
