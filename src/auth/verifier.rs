//! Credential verification with a response-time floor

use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::ExposeSecret;

use crate::models::user::User;
use crate::store::UserStore;

use super::{password::PasswordHasher, random_urlsafe_token};

/// Checks an email/password pair against the user store.
///
/// Outcomes are reported as presence or absence of the user, never as a
/// reason. Every call runs an Argon2 verification and is padded to a
/// configurable floor, so lookup misses and password mismatches are not
/// distinguishable by response time.
pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    min_latency: Duration,
}

impl CredentialVerifier {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<PasswordHasher>, min_latency: Duration) -> Self {
        Self {
            users,
            hasher,
            min_latency,
        }
    }

    /// Verify a credential pair.
    ///
    /// Returns the user only when the account exists and the password
    /// matches. A store failure is logged and treated as an absent account.
    pub async fn verify_credential(&self, email: &str, password: &str) -> Option<User> {
        let started = Instant::now();

        let user = match self.users.find_by_email(email).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "User lookup failed during credential check");
                None
            }
        };

        let verified = match &user {
            Some(user) => self
                .hasher
                .verify(password, user.password_hash.expose_secret()),
            None => {
                // Burn a hash for unknown accounts so they exercise the same
                // Argon2 work as known ones
                let fake = self.fake_hash();
                self.hasher.verify(password, &fake);
                false
            }
        };

        self.pad_to_floor(started).await;

        if verified {
            user
        } else {
            None
        }
    }

    /// Sleep out the remainder of the latency floor.
    async fn pad_to_floor(&self, started: Instant) {
        if let Some(remaining) = self.min_latency.checked_sub(started.elapsed()) {
            tokio::time::sleep(remaining).await;
        }
    }

    /// Hash of a throwaway random value, used when no account matched.
    fn fake_hash(&self) -> String {
        match self.hasher.hash(&random_urlsafe_token(32)) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!(error = %e, "Failed to produce throwaway hash");
                String::new()
            }
        }
    }
}
