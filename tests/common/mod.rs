//! 测试公共模块
//! 提供测试辅助函数和测试工具

use std::sync::Arc;

use auth_core::{
    auth::password::PasswordHasher,
    auth::token::SessionTokenService,
    config::{
        AuthConfig, CsrfConfig, LoggingConfig, PasswordConfig, RateLimitConfig, TokenConfig,
        VerifierConfig,
    },
    models::user::NewUser,
    services::AuthService,
    store::{MemoryCounterStore, MemoryUserStore, UserStore},
};
use secrecy::Secret;

/// 创建测试配置
pub fn create_test_config() -> AuthConfig {
    AuthConfig {
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        token: TokenConfig {
            secret: Secret::new("test-secret-key-for-testing-only-min-32-chars".to_string()),
            algorithm: "HS256".to_string(),
            ttl_minutes: 5, // 5分钟用于测试
        },
        password: PasswordConfig {
            min_length: 8,
            max_length: 64,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: false,
        },
        rate_limit: RateLimitConfig {
            threshold: 5,
            window_secs: 3600,
        },
        csrf: CsrfConfig {
            expected_origin: "http://localhost:8000".to_string(),
            ttl_secs: 3600,
        },
        // 功能测试不需要响应时延下限
        verifier: VerifierConfig { min_latency_ms: 0 },
    }
}

/// 带响应时延下限的测试配置
#[allow(dead_code)]
pub fn config_with_floor(min_latency_ms: u64) -> AuthConfig {
    let mut config = create_test_config();
    config.verifier.min_latency_ms = min_latency_ms;
    config
}

/// 构建测试服务及其内存存储
#[allow(dead_code)]
pub fn create_test_service(
    config: AuthConfig,
) -> (Arc<MemoryUserStore>, Arc<MemoryCounterStore>, AuthService) {
    let users = Arc::new(MemoryUserStore::new());
    let counters = Arc::new(MemoryCounterStore::new());
    let tokens =
        SessionTokenService::from_config(&config).expect("Failed to create token service");
    let service = AuthService::new(users.clone(), counters.clone(), tokens, Arc::new(config));
    (users, counters, service)
}

/// 创建测试用户，返回用户 ID
#[allow(dead_code)]
pub async fn create_test_user(
    users: &MemoryUserStore,
    email: &str,
    password: &str,
) -> uuid::Uuid {
    let hasher = PasswordHasher::new();
    let password_hash = hasher.hash(password).expect("Failed to hash password");

    users
        .create(NewUser {
            email: email.to_string(),
            password_hash: Secret::new(password_hash),
            full_name: "Test User".to_string(),
        })
        .await
        .expect("Failed to create test user")
}
