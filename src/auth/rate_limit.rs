//! Fixed-window attempt limiting on a counter store
//!
//! Each failed attempt increments a per-key counter and refreshes its
//! window-length TTL, so a key only goes quiet after a full window without
//! failures. Limit checks read the counter as it stands; crossing the
//! threshold inside one window blocks further attempts. Store failures never
//! lock users out: every operation degrades to "not limited" with a warning.

use std::sync::Arc;
use std::time::Duration;

use crate::store::CounterStore;

/// Counter key for failed logins against one account
pub fn login_attempts_key(email: &str) -> String {
    format!("login_attempts:{}", email)
}

/// Counter key for registration attempts from one address
pub fn registration_attempts_key(ip: &str) -> String {
    format!("reg_attempts:{}", ip)
}

/// Fixed-window rate limiter
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    threshold: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, threshold: u64, window: Duration) -> Self {
        Self {
            store,
            threshold,
            window,
        }
    }

    /// Whether `key` has reached the attempt threshold in its current window.
    pub async fn is_limited(&self, key: &str) -> bool {
        match self.store.get(key).await {
            Ok(Some(value)) => match value.parse::<u64>() {
                Ok(count) => count >= self.threshold,
                Err(_) => {
                    tracing::warn!(key, %value, "Counter value is not numeric; treating as not limited");
                    false
                }
            },
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(key, error = %e, "Counter store unavailable; treating key as not limited");
                false
            }
        }
    }

    /// Record one failed attempt against `key` and refresh its window.
    pub async fn increment(&self, key: &str) {
        match self.store.incr(key).await {
            Ok(_) => {
                if let Err(e) = self.store.expire(key, self.window).await {
                    tracing::warn!(key, error = %e, "Failed to set attempt counter expiry");
                }
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to increment attempt counter");
            }
        }
    }

    /// Drop the counter for `key`, ending its window early.
    pub async fn clear(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key, error = %e, "Failed to clear attempt counter");
        }
    }
}
