//! Authentication primitives

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};

pub mod csrf;
pub mod password;
pub mod rate_limit;
pub mod token;
pub mod verifier;

pub use csrf::{CsrfGuard, MemorySession, Session};
pub use password::PasswordHasher;
pub use rate_limit::RateLimiter;
pub use token::{HmacSigner, SessionClaims, SessionTokenService, TokenSigner};
pub use verifier::CredentialVerifier;

/// Generate `n_bytes` of OS randomness as an unpadded URL-safe base64 string.
///
/// Used for CSRF tokens and session identifiers.
pub fn random_urlsafe_token(n_bytes: usize) -> String {
    let mut bytes = vec![0u8; n_bytes];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
