//! Local persistence of the last successful search.
//!
//! [`UserCache`] is the seam the search service writes through and falls
//! back to. [`SeaOrmUserCache`] persists to a SQL database;
//! [`MemoryUserCache`] keeps everything in process.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

use crate::models::UserRecord;

mod sql;

pub use sql::SeaOrmUserCache;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// The cache cannot be used right now.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A store of user records keyed by GitHub user ID.
#[async_trait]
pub trait UserCache: Send + Sync {
    /// Insert or replace each record by ID.
    ///
    /// Writing the same records twice leaves the same contents as writing
    /// them once. Returns the number of distinct IDs written.
    async fn upsert(&self, users: &[UserRecord]) -> Result<u64>;

    /// Every cached record, ordered by ID.
    async fn load_all(&self) -> Result<Vec<UserRecord>>;

    /// Records whose login contains `fragment`, ignoring case, ordered by ID.
    ///
    /// A blank fragment matches everything.
    async fn find_by_login(&self, fragment: &str) -> Result<Vec<UserRecord>>;
}

/// Collapse duplicate IDs, keeping the last occurrence.
pub(crate) fn dedup_by_id(users: &[UserRecord]) -> Vec<&UserRecord> {
    let mut latest: BTreeMap<i64, &UserRecord> = BTreeMap::new();
    for user in users {
        latest.insert(user.id, user);
    }
    latest.into_values().collect()
}

/// In-process cache backed by a sorted map.
#[derive(Debug, Default)]
pub struct MemoryUserCache {
    users: Mutex<BTreeMap<i64, UserRecord>>,
}

impl MemoryUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<i64, UserRecord>>> {
        self.users
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserCache for MemoryUserCache {
    async fn upsert(&self, users: &[UserRecord]) -> Result<u64> {
        let deduped = dedup_by_id(users);
        let mut map = self.lock()?;
        for user in &deduped {
            map.insert(user.id, (*user).clone());
        }
        Ok(deduped.len() as u64)
    }

    async fn load_all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    async fn find_by_login(&self, fragment: &str) -> Result<Vec<UserRecord>> {
        let needle = fragment.trim().to_lowercase();
        Ok(self
            .lock()?
            .values()
            .filter(|user| user.login.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
