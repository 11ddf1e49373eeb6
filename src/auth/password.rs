//! Password hashing and verification using Argon2id

use crate::{config::AuthConfig, error::AuthError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Password hasher with configurable parameters
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create hasher with default parameters (OWASP recommended)
    pub fn new() -> Self {
        // OWASP recommended parameters (as of 2024)
        // m=64MiB, t=3 iterations, p=4 lanes
        let params = Params::new(65536, 3, 4, None).expect("Invalid Argon2 params");

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Self { argon2 }
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AuthError::internal_error(format!("Failed to hash password: {}", e))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash.
    ///
    /// Returns `false` for a mismatch and also for a hash that cannot be
    /// parsed. A malformed hash means corrupt stored data, so it is logged,
    /// but the caller only ever learns that the credential did not match.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Malformed password hash in store: {:?}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Validate password against policy
    pub fn validate_password_policy(password: &str, config: &AuthConfig) -> Result<(), AuthError> {
        let policy = &config.password;

        // Check length (bytes, matching what the hasher consumes)
        if password.len() < policy.min_length {
            return Err(AuthError::validation(
                "password",
                format!("Password must be at least {} characters", policy.min_length),
            ));
        }

        if password.len() > policy.max_length {
            return Err(AuthError::validation(
                "password",
                format!("Password must be at most {} characters", policy.max_length),
            ));
        }

        // Check uppercase
        if policy.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            return Err(AuthError::validation(
                "password",
                "Password must contain at least one uppercase letter",
            ));
        }

        // Check lowercase
        if policy.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            return Err(AuthError::validation(
                "password",
                "Password must contain at least one lowercase letter",
            ));
        }

        // Check digit
        if policy.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AuthError::validation(
                "password",
                "Password must contain at least one digit",
            ));
        }

        // Check special character
        if policy.require_special {
            let has_special = password.chars().any(|c| !c.is_alphanumeric());
            if !has_special {
                return Err(AuthError::validation(
                    "password",
                    "Password must contain at least one special character",
                ));
            }
        }

        Ok(())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_config() -> AuthConfig {
        AuthConfig {
            logging: crate::config::LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            token: crate::config::TokenConfig {
                secret: secrecy::Secret::new(
                    "test_signing_secret_at_least_32_chars!".to_string(),
                ),
                algorithm: "HS256".to_string(),
                ttl_minutes: 30,
            },
            password: crate::config::PasswordConfig {
                min_length: 8,
                max_length: 64,
                require_uppercase: true,
                require_lowercase: true,
                require_digit: true,
                require_special: false,
            },
            rate_limit: crate::config::RateLimitConfig {
                threshold: 5,
                window_secs: 3600,
            },
            csrf: crate::config::CsrfConfig {
                expected_origin: "http://localhost:8000".to_string(),
                ttl_secs: 3600,
            },
            verifier: crate::config::VerifierConfig { min_latency_ms: 0 },
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let password = "TestPassword123!";

        let hash = hasher.hash(password).unwrap();
        assert!(hasher.verify(password, &hash));
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = PasswordHasher::new();
        let password = "TestPassword123!";

        let hash = hasher.hash(password).unwrap();
        assert!(!hasher.verify("WrongPassword", &hash));
    }

    #[test]
    fn test_verify_malformed_hash_returns_false() {
        let hasher = PasswordHasher::new();

        assert!(!hasher.verify("TestPassword123!", "not-a-phc-string"));
        assert!(!hasher.verify("TestPassword123!", ""));
        assert!(!hasher.verify("TestPassword123!", "$argon2id$v=19$truncated"));
    }

    #[test]
    fn test_hash_is_different_each_time() {
        let hasher = PasswordHasher::new();
        let password = "TestPassword123!";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        // Hashes should be different due to salt
        assert_ne!(hash1, hash2);

        // But both should verify correctly
        assert!(hasher.verify(password, &hash1));
        assert!(hasher.verify(password, &hash2));
    }

    #[test]
    fn test_unicode_password_round_trip() {
        let hasher = PasswordHasher::new();
        let password = "Pässwörd123日本語";

        let hash = hasher.hash(password).unwrap();
        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("Passwort123", &hash));
    }

    #[test]
    fn test_password_policy_validation() {
        let config = policy_config();

        // Valid password
        assert!(PasswordHasher::validate_password_policy("Test1234", &config).is_ok());

        // Too short
        assert!(PasswordHasher::validate_password_policy("Test1", &config).is_err());

        // Too long
        let long = format!("Aa1{}", "x".repeat(80));
        assert!(PasswordHasher::validate_password_policy(&long, &config).is_err());

        // No uppercase
        assert!(PasswordHasher::validate_password_policy("test1234", &config).is_err());

        // No lowercase
        assert!(PasswordHasher::validate_password_policy("TEST1234", &config).is_err());

        // No digit
        assert!(PasswordHasher::validate_password_policy("Testtest", &config).is_err());
    }

    #[test]
    fn test_password_policy_reports_field() {
        let config = policy_config();

        match PasswordHasher::validate_password_policy("short", &config) {
            Err(AuthError::ValidationFailed { field, reason }) => {
                assert_eq!(field, "password");
                assert!(reason.contains("at least 8"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_password_policy_special_character() {
        let mut config = policy_config();
        config.password.require_special = true;

        assert!(PasswordHasher::validate_password_policy("Test1234", &config).is_err());
        assert!(PasswordHasher::validate_password_policy("Test1234!", &config).is_ok());
    }
}
