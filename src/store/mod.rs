//! Persistence seams.
//!
//! The credential store, the revocation ledger's storage and the task store are
//! traits so the same auth core runs over Postgres in production and over
//! [`memory::MemoryStore`] in development and tests.

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, Task, TaskUpdate, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The store could not be reached in time.
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persisted user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the email is already registered.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    /// Looks a user up by login handle (email).
    async fn find_by_handle(&self, email: &str) -> StoreResult<Option<User>>;
}

/// Durable keyed storage behind the revocation ledger.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when `token` is already present.
    async fn insert_revoked(&self, token: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;

    async fn contains_revoked(&self, token: &str) -> StoreResult<bool>;

    /// Deletes every entry with `expires_at <= now` and returns how many went.
    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, task: Task) -> StoreResult<Task>;

    /// Tasks owned by `user_id`, newest first.
    async fn list_tasks(&self, user_id: &str) -> StoreResult<Vec<Task>>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Returns `None` when the task no longer exists.
    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> StoreResult<Option<Task>>;

    /// Returns whether a row was removed.
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}

/// Runs a store operation under `limit`, turning an elapsed timer into
/// [`StoreError::Unavailable`].
pub async fn bounded<T, F>(limit: Duration, operation: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Unavailable(format!(
            "store operation exceeded {:?}",
            limit
        ))),
    }
}
