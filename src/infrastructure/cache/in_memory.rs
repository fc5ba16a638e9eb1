use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::errors::SplitsyncError;
use crate::core::models::GroupBalance;
use crate::infrastructure::cache::{Cache, cache_keys};

#[derive(Clone)]
pub struct InMemoryCache {
    cache: Arc<RwLock<HashMap<String, (Vec<GroupBalance>, DateTime<Utc>)>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        InMemoryCache {
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_group_balances(
        &self,
        group_id: &str,
    ) -> Result<Option<Vec<GroupBalance>>, SplitsyncError> {
        let key = cache_keys::group_balances_key(group_id);
        let cache = self.cache.read().await;
        Ok(cache.get(&key).and_then(|(balances, expires_at)| {
            if *expires_at > Utc::now() {
                Some(balances.clone())
            } else {
                None
            }
        }))
    }

    async fn save_group_balances(
        &self,
        group_id: &str,
        balances: &[GroupBalance],
        ttl: std::time::Duration,
    ) -> Result<(), SplitsyncError> {
        let key = cache_keys::group_balances_key(group_id);
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| SplitsyncError::CacheError(format!("invalid TTL: {}", e)))?;
        let mut cache = self.cache.write().await;
        cache.insert(key, (balances.to_vec(), expires_at));
        Ok(())
    }

    async fn invalidate_group_balances(&self, group_id: &str) -> Result<(), SplitsyncError> {
        let key = cache_keys::group_balances_key(group_id);
        let mut cache = self.cache.write().await;
        cache.remove(&key);
        Ok(())
    }
}
