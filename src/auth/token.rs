//! Session token issuance and validation
//! Symmetric JWT signing behind a pluggable signer seam

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AuthConfig, TokenConfig},
    error::AuthError,
};

use super::random_urlsafe_token;

/// Issuer claim stamped into every token
pub const TOKEN_ISSUER: &str = "auth-core";

/// Audience claim stamped into every token
pub const TOKEN_AUDIENCE: &str = "auth-web";

/// Token type for session access tokens
pub const TOKEN_TYPE_ACCESS: &str = "access";

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Token type, `"access"` for session tokens
    #[serde(rename = "type")]
    pub token_type: String,

    /// Opaque per-login session identifier
    pub session_id: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,
}

/// Signs and verifies serialized claims.
///
/// The session service only depends on this seam, so deployments can swap the
/// HMAC signer for an asymmetric or KMS-backed one without touching callers.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError>;
    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError>;
}

/// HMAC-based signer (HS256/HS384/HS512)
pub struct HmacSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
}

impl HmacSigner {
    /// Create signer from token config
    pub fn from_config(config: &TokenConfig) -> Result<Self, AuthError> {
        let secret = config.secret.expose_secret();

        // Ensure secret is at least 32 bytes for HMAC signing
        if secret.len() < 32 {
            return Err(AuthError::Config(
                "Signing secret too short (min 32 chars)".to_string(),
            ));
        }

        let algorithm = match config.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => {
                return Err(AuthError::Config(format!(
                    "Unsupported signing algorithm: {}",
                    other
                )))
            }
        };

        let mut validation = Validation::new(algorithm);
        // No clock leeway, expiry is enforced exactly
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            header: Header::new(algorithm),
            validation,
        })
    }
}

impl TokenSigner for HmacSigner {
    fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        encode(&self.header, claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode session token: {:?}", e);
            AuthError::internal_error(format!("Failed to encode session token: {}", e))
        })
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        Ok(decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AuthError::TokenInvalid
            })?
            .claims)
    }
}

/// Session token service
pub struct SessionTokenService {
    signer: Arc<dyn TokenSigner>,
    ttl_minutes: u64,
}

impl SessionTokenService {
    pub fn new(signer: Arc<dyn TokenSigner>, ttl_minutes: u64) -> Self {
        Self {
            signer,
            ttl_minutes,
        }
    }

    /// Create service with an HMAC signer from config
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let signer = HmacSigner::from_config(&config.token)?;
        Ok(Self::new(Arc::new(signer), config.token.ttl_minutes))
    }

    /// Seconds a freshly issued token stays valid
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_minutes * 60
    }

    /// Issue a session token for a user.
    ///
    /// When `session_id` is `None` a random one is generated, so every login
    /// gets its own session identity even for the same user.
    pub fn issue(&self, user_id: &Uuid, session_id: Option<String>) -> Result<String, AuthError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.ttl_minutes as i64);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            token_type: TOKEN_TYPE_ACCESS.to_string(),
            session_id: session_id.unwrap_or_else(|| random_urlsafe_token(32)),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
        };

        self.signer.sign(&claims)
    }

    /// Validate and decode a token
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.signer.verify(token)
    }

    /// Validate a session access token specifically
    pub fn verify_access(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let claims = self.verify(token)?;

        if claims.token_type != TOKEN_TYPE_ACCESS {
            tracing::debug!(
                "Token type mismatch: expected '{}', got '{}'",
                TOKEN_TYPE_ACCESS,
                claims.token_type
            );
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }
}
