//! Storage abstractions
//!
//! The authentication flows depend on two narrow seams: a user store for
//! account lookup and creation, and a counter store for rate-limit counters
//! and session markers. Production deployments back these with a database
//! and Redis; the in-memory implementations in [`memory`] serve tests and
//! single-process setups.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::{NewUser, User};

pub mod memory;

pub use memory::{MemoryCounterStore, MemoryUserStore};

/// Storage layer error
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Backend answered but the operation failed
    #[error("Store operation failed: {0}")]
    Operation(String),
}

/// User account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Check whether an account with this email already exists.
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// Persist a new account and return its id.
    async fn create(&self, new_user: NewUser) -> Result<Uuid, StoreError>;
}

/// Counter and marker storage with per-key expiry.
///
/// The surface mirrors the handful of commands the rate limiter and session
/// bookkeeping need: increment, TTL management, read, delete, and a plain
/// set-with-expiry for marker values.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment the counter at `key` by one, creating it at 1 when absent.
    /// Returns the value after the increment.
    async fn incr(&self, key: &str) -> Result<u64, StoreError>;

    /// Set the remaining lifetime of `key`.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Read the raw value at `key`, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Store `value` at `key` with the given lifetime.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration)
        -> Result<(), StoreError>;
}
