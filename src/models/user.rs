//! User domain models

use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde::Serialize;
use uuid::Uuid;

/// User account as held by the external user store.
///
/// The stored password hash is wrapped in `Secret` so it never shows up in
/// `Debug` output or log events. It is compared only through
/// `PasswordHasher::verify`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Secret<String>,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a user (identity already normalized, secret already
/// hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Secret<String>,
    pub full_name: String,
}

/// User response (without sensitive data)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
        }
    }
}
