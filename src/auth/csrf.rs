//! CSRF protection with session-bound synchronizer tokens

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::{config::AuthConfig, error::AuthError};

use super::random_urlsafe_token;

/// Session key holding the CSRF token
pub const CSRF_SESSION_KEY: &str = "csrf_token";

/// Session key holding the token's mint time (unix seconds)
const CSRF_ISSUED_AT_KEY: &str = "csrf_token_issued_at";

const CSRF_TOKEN_BYTES: usize = 32;

/// Minimal key-value view of a request session.
///
/// The guard only reads and writes its own keys, so any session backend the
/// boundary uses can implement this.
pub trait Session {
    fn get(&self, key: &str) -> Option<&str>;
    fn insert(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str) -> Option<String>;
}

/// Plain in-memory session
#[derive(Debug, Default)]
pub struct MemorySession {
    values: HashMap<String, String>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Session for MemorySession {
    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|value| value.as_str())
    }

    fn insert(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

/// Synchronizer-token CSRF guard.
///
/// A token minted into the session must be echoed back by the client on
/// state-changing requests. Validation also checks the Origin (or Referer)
/// header against the configured origin, and a validated token is consumed
/// so it cannot be replayed.
pub struct CsrfGuard {
    expected_origin: String,
    ttl: Duration,
}

impl CsrfGuard {
    pub fn new(expected_origin: impl Into<String>, ttl: Duration) -> Self {
        Self {
            expected_origin: expected_origin.into(),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.csrf.expected_origin.clone(),
            Duration::from_secs(config.csrf.ttl_secs),
        )
    }

    /// Return the session's token, minting one if absent or expired.
    ///
    /// Repeated calls within a session hand out the same token, so a page
    /// with several forms shares one.
    pub fn get_or_create_token(&self, session: &mut dyn Session) -> String {
        if let Some(token) = self.stored_token(&*session) {
            return token;
        }

        let token = random_urlsafe_token(CSRF_TOKEN_BYTES);
        session.insert(CSRF_SESSION_KEY, token.clone());
        session.insert(CSRF_ISSUED_AT_KEY, Utc::now().timestamp().to_string());
        token
    }

    /// Check a submitted token against the session.
    ///
    /// `origin` is the request's Origin header, falling back to Referer when
    /// the boundary has only that. A missing header skips the origin check;
    /// a present one must start with the expected origin.
    pub fn validate(&self, session: &dyn Session, candidate: &str, origin: Option<&str>) -> bool {
        if let Some(origin) = origin {
            if !origin.starts_with(&self.expected_origin) {
                tracing::warn!(origin, "Cross-site request blocked: unexpected origin");
                return false;
            }
        }

        let stored = match self.stored_token(session) {
            Some(stored) => stored,
            None => {
                tracing::warn!("CSRF validation failed: no usable token in session");
                return false;
            }
        };

        constant_time_eq(candidate.as_bytes(), stored.as_bytes())
    }

    /// Drop the session's token after a successful state change.
    pub fn consume_on_success(&self, session: &mut dyn Session) {
        session.remove(CSRF_SESSION_KEY);
        session.remove(CSRF_ISSUED_AT_KEY);
    }

    /// Validate and consume in one step.
    pub fn protect(
        &self,
        session: &mut dyn Session,
        candidate: &str,
        origin: Option<&str>,
    ) -> Result<(), AuthError> {
        if !self.validate(&*session, candidate, origin) {
            return Err(AuthError::CsrfRejected);
        }
        self.consume_on_success(session);
        Ok(())
    }

    /// Stored token if it exists and has not outlived its TTL.
    fn stored_token(&self, session: &dyn Session) -> Option<String> {
        let token = session.get(CSRF_SESSION_KEY)?;
        let issued_at: i64 = session.get(CSRF_ISSUED_AT_KEY)?.parse().ok()?;

        let age = Utc::now().timestamp().saturating_sub(issued_at);
        if age < 0 || age as u64 > self.ttl.as_secs() {
            tracing::debug!(age, "CSRF token outlived its TTL");
            return None;
        }

        Some(token.to_string())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
