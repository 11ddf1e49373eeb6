//! 认证服务：登录、注册、登出与会话查询

use crate::{
    auth::password::PasswordHasher,
    auth::rate_limit::{login_attempts_key, registration_attempts_key, RateLimiter},
    auth::token::SessionTokenService,
    auth::verifier::CredentialVerifier,
    config::AuthConfig,
    error::AuthError,
    models::auth::{LoginRequest, LoginResponse, RegisterRequest},
    models::user::{NewUser, UserResponse},
    store::{CounterStore, UserStore},
};
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid email regex"));

pub struct AuthService {
    users: Arc<dyn UserStore>,
    counters: Arc<dyn CounterStore>,
    hasher: Arc<PasswordHasher>,
    verifier: CredentialVerifier,
    tokens: SessionTokenService,
    limiter: RateLimiter,
    config: Arc<AuthConfig>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        counters: Arc<dyn CounterStore>,
        tokens: SessionTokenService,
        config: Arc<AuthConfig>,
    ) -> Self {
        let hasher = Arc::new(PasswordHasher::new());
        let verifier = CredentialVerifier::new(
            users.clone(),
            hasher.clone(),
            Duration::from_millis(config.verifier.min_latency_ms),
        );
        let limiter = RateLimiter::new(
            counters.clone(),
            config.rate_limit.threshold,
            Duration::from_secs(config.rate_limit.window_secs),
        );

        Self {
            users,
            counters,
            hasher,
            verifier,
            tokens,
            limiter,
            config,
        }
    }

    /// 用户登录
    ///
    /// 所有拒绝路径统一补足到最小响应时长，拒绝原因之间在时间上不可区分
    pub async fn login(&self, req: LoginRequest, client_ip: &str) -> Result<LoginResponse, AuthError> {
        let started = Instant::now();
        let result = self.login_inner(req, client_ip).await;
        if result.is_err() {
            self.pad_rejection_latency(started).await;
        }
        result
    }

    async fn login_inner(
        &self,
        req: LoginRequest,
        client_ip: &str,
    ) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(&req.email);

        // 邮箱格式不合法时直接拒绝，不触碰限流计数
        if !valid_email(&email) {
            metrics::counter!("auth_login_total", "outcome" => "rejected").increment(1);
            return Err(AuthError::InvalidCredentials);
        }

        // 检查速率限制（按账户计数）
        let attempts_key = login_attempts_key(&email);
        if self.limiter.is_limited(&attempts_key).await {
            tracing::warn!(%client_ip, email = %email, "Rate limit exceeded for login");
            metrics::counter!("auth_login_total", "outcome" => "rate_limited").increment(1);
            return Err(AuthError::RateLimited);
        }

        // 验证凭证
        let user = match self
            .verifier
            .verify_credential(&email, req.password.expose_secret())
            .await
        {
            Some(user) => user,
            None => {
                self.limiter.increment(&attempts_key).await;
                metrics::counter!("auth_login_total", "outcome" => "rejected").increment(1);
                return Err(AuthError::InvalidCredentials);
            }
        };

        // 登录成功，清除失败计数
        self.limiter.clear(&attempts_key).await;

        // 生成会话令牌
        let access_token = self.tokens.issue(&user.id, None)?;

        // 写入会话活跃标记
        self.mark_session_active(&user.id).await;

        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            access_token,
            expires_in: self.tokens.ttl_secs(),
            user: UserResponse::from(user),
        })
    }

    /// 用户注册
    pub async fn register(&self, req: RegisterRequest, client_ip: &str) -> Result<Uuid, AuthError> {
        let email = normalize_email(&req.email);
        let attempts_key = registration_attempts_key(client_ip);

        // 检查速率限制（按来源地址计数，被拦下的请求不再计数）
        if self.limiter.is_limited(&attempts_key).await {
            tracing::warn!(%client_ip, "Rate limit exceeded for registration");
            metrics::counter!("auth_register_total", "outcome" => "rate_limited").increment(1);
            return Err(AuthError::RateLimited);
        }

        // 字段校验，先于唯一性检查
        if let Err(e) = self.validate_registration(&email, &req) {
            self.limiter.increment(&attempts_key).await;
            metrics::counter!("auth_register_total", "outcome" => "invalid").increment(1);
            return Err(e);
        }

        // 唯一性检查
        match self.users.exists_by_email(&email).await {
            Ok(true) => {
                self.limiter.increment(&attempts_key).await;
                metrics::counter!("auth_register_total", "outcome" => "duplicate").increment(1);
                return Err(AuthError::AlreadyExists);
            }
            Ok(false) => {}
            Err(e) => {
                // 存储不可用不属于调用方行为，不计入限流
                tracing::warn!(error = %e, "Uniqueness check failed during registration");
                metrics::counter!("auth_register_total", "outcome" => "error").increment(1);
                return Err(e.into());
            }
        }

        // 哈希口令并落库
        match self.create_user(&email, &req).await {
            Ok(user_id) => {
                metrics::counter!("auth_register_total", "outcome" => "success").increment(1);
                tracing::info!(user_id = %user_id, "User registered");
                Ok(user_id)
            }
            Err(e) => {
                self.limiter.increment(&attempts_key).await;
                metrics::counter!("auth_register_total", "outcome" => "error").increment(1);
                Err(e)
            }
        }
    }

    /// 登出：删除会话活跃标记
    ///
    /// 已签发的令牌在到期之前仍然可以通过校验，标记只反映“最近登录过”
    pub async fn logout(&self, user_id: &Uuid) {
        let key = session_marker_key(user_id);
        if let Err(e) = self.counters.delete(&key).await {
            tracing::warn!(%user_id, error = %e, "Failed to clear session marker");
        }
        tracing::info!(%user_id, "User logged out");
    }

    /// 从令牌解析当前用户
    ///
    /// 只依赖令牌自身的签名与声明，不回查存储
    pub fn current_user(&self, token: &str) -> Option<Uuid> {
        let claims = self.tokens.verify_access(token).ok()?;
        match Uuid::parse_str(&claims.sub) {
            Ok(user_id) => Some(user_id),
            Err(_) => {
                tracing::warn!("Session token carried a non-UUID subject");
                None
            }
        }
    }

    /// 注册字段校验：邮箱、口令、姓名，顺序固定
    fn validate_registration(&self, email: &str, req: &RegisterRequest) -> Result<(), AuthError> {
        if !valid_email(email) {
            return Err(AuthError::validation("email", "Invalid email address"));
        }
        PasswordHasher::validate_password_policy(req.password.expose_secret(), &self.config)?;
        validate_full_name(&req.full_name)?;
        Ok(())
    }

    async fn create_user(&self, email: &str, req: &RegisterRequest) -> Result<Uuid, AuthError> {
        let password_hash = self.hasher.hash(req.password.expose_secret())?;
        let new_user = NewUser {
            email: email.to_string(),
            password_hash: Secret::new(password_hash),
            full_name: req.full_name.trim().to_string(),
        };

        self.users.create(new_user).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to create user");
            AuthError::from(e)
        })
    }

    /// 写入会话活跃标记，生存期与令牌一致
    async fn mark_session_active(&self, user_id: &Uuid) {
        let key = session_marker_key(user_id);
        let ttl = Duration::from_secs(self.tokens.ttl_secs());
        if let Err(e) = self.counters.set_with_ttl(&key, "active", ttl).await {
            tracing::warn!(%user_id, error = %e, "Failed to write session marker");
        }
    }

    /// 将拒绝响应补足到最小时长
    async fn pad_rejection_latency(&self, started: Instant) {
        let floor = Duration::from_millis(self.config.verifier.min_latency_ms);
        if let Some(remaining) = floor.checked_sub(started.elapsed()) {
            tokio::time::sleep(remaining).await;
        }
    }
}

/// 会话活跃标记的存储键
pub fn session_marker_key(user_id: &Uuid) -> String {
    format!("session:{}", user_id)
}

/// 规范化邮箱：去除首尾空白并统一小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn validate_full_name(full_name: &str) -> Result<(), AuthError> {
    let trimmed = full_name.trim();
    if trimmed.len() < 4 {
        return Err(AuthError::validation(
            "full_name",
            "Full name must be at least 4 characters",
        ));
    }
    if trimmed.len() > 100 {
        return Err(AuthError::validation(
            "full_name",
            "Full name must be at most 100 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM  "), "user@example.com");
        assert_eq!(normalize_email("user@example.com"), "user@example.com");
    }

    #[test]
    fn test_valid_email() {
        assert!(valid_email("user@example.com"));
        assert!(valid_email("a.b+c@sub.example.co"));

        assert!(!valid_email(""));
        assert!(!valid_email("plainaddress"));
        assert!(!valid_email("missing-tld@host"));
        assert!(!valid_email("spaced user@example.com"));
        assert!(!valid_email("@example.com"));
    }

    #[test]
    fn test_validate_full_name() {
        assert!(validate_full_name("Jane Doe").is_ok());
        assert!(validate_full_name("  Jane Doe  ").is_ok());

        assert!(validate_full_name("Jo").is_err());
        assert!(validate_full_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_session_marker_key() {
        let user_id = Uuid::nil();
        assert_eq!(
            session_marker_key(&user_id),
            "session:00000000-0000-0000-0000-000000000000"
        );
    }
}
