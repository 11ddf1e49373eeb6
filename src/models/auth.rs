//! Authentication-related models

use secrecy::Secret;
use serde::{Deserialize, Serialize};

use super::user::UserResponse;

/// Cookie name the boundary uses for the session token
pub const SESSION_COOKIE_NAME: &str = "access_token";

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: Secret<String>,
}

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: Secret<String>,
    pub full_name: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: u64, // seconds until the token expires
    pub user: UserResponse,
}

/// Session cookie the HTTP boundary sets from a login response.
///
/// Attributes are fixed: `HttpOnly`, `SameSite=Lax`, site-scoped path,
/// max-age equal to the token TTL, and `Secure` outside debug environments.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub value: String,
    pub max_age_secs: u64,
    pub secure: bool,
}

impl SessionCookie {
    /// Cookie carrying a freshly issued token.
    pub fn for_token(token: impl Into<String>, max_age_secs: u64, secure: bool) -> Self {
        Self {
            value: token.into(),
            max_age_secs,
            secure,
        }
    }

    /// Expired empty cookie used to clear the session on logout.
    pub fn cleared(secure: bool) -> Self {
        Self {
            value: String::new(),
            max_age_secs: 0,
            secure,
        }
    }

    /// Render the `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.value, self.max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
