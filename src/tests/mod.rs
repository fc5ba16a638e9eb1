mod notification_tests;
mod pending_tests;
mod settlement_tests;
mod split_tests;

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::core::models::{Group, User};
use crate::core::service::SplitsyncService;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::realtime::NotificationRouter;

pub type TestService = SplitsyncService<InMemoryLogging, InMemoryStorage, InMemoryCache>;

pub fn create_test_service() -> TestService {
    let storage = Arc::new(InMemoryStorage::new());
    let router = Arc::new(NotificationRouter::new(storage.clone()));
    SplitsyncService::new(
        storage,
        InMemoryLogging::new(),
        InMemoryCache::new(),
        router,
        "test-secret".to_string(),
    )
}

pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Seeds a user straight through storage so tests skip the bcrypt work in
/// `add_user`; registration itself is covered separately.
pub async fn seed_user(service: &TestService, id: &str, name: &str) -> User {
    service
        .storage()
        .create_user_if_not_exists(User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            password: "hashed".to_string(),
        })
        .await
        .unwrap()
}

pub async fn seed_group(service: &TestService, name: &str, members: &[&User]) -> Group {
    let owner = members[0];
    service
        .create_group(
            name.to_string(),
            members.iter().map(|&u| u.clone()).collect(),
            owner,
        )
        .await
        .unwrap()
}
