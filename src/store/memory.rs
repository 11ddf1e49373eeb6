//! In-memory store implementations
//!
//! Process-local backends for tests and single-instance deployments. Counter
//! expiry is lazy: a key past its deadline is dropped the next time it is
//! touched, which matches how the limiter and session markers read them.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::user::{NewUser, User};

use super::{CounterStore, StoreError, UserStore};

/// User accounts held in a concurrent map keyed by normalized email.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(email).map(|user| user.clone()))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.users.contains_key(email))
    }

    async fn create(&self, new_user: NewUser) -> Result<Uuid, StoreError> {
        use dashmap::mapref::entry::Entry;

        let id = Uuid::new_v4();
        match self.users.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Operation(format!(
                "duplicate email: {}",
                new_user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(User {
                    id,
                    email: new_user.email,
                    password_hash: new_user.password_hash,
                    full_name: new_user.full_name,
                    created_at: Utc::now(),
                });
                Ok(id)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct CounterEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    fn fresh(value: String) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Counters and markers held in a concurrent map with per-key deadlines.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: DashMap<String, CounterEntry>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| CounterEntry::fresh("0".to_string()));
        if entry.is_expired() {
            // Expired counters restart from zero with no deadline.
            *entry = CounterEntry::fresh("0".to_string());
        }
        let current: u64 = entry.value.parse().map_err(|_| {
            StoreError::Operation(format!("value at {key} is not an integer"))
        })?;
        let next = current + 1;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                return Ok(());
            }
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.entries.insert(
            key.to_string(),
            CounterEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }
}
