//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// 签名密钥（使用 Secret 包装，防止日志泄露）。无默认值，缺失时启动失败
    pub secret: Secret<String>,
    /// 签名算法: HS256, HS384, HS512
    pub algorithm: String,
    /// 访问令牌过期时间（分钟）
    pub ttl_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    /// 密码最小长度
    pub min_length: usize,
    /// 密码最大长度
    pub max_length: usize,
    /// 密码必须包含大写字母
    pub require_uppercase: bool,
    /// 密码必须包含小写字母
    pub require_lowercase: bool,
    /// 密码必须包含数字
    pub require_digit: bool,
    /// 密码必须包含特殊字符
    pub require_special: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// 窗口内允许的最大失败次数，达到后拒绝
    pub threshold: u64,
    /// 计数窗口长度（秒）
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsrfConfig {
    /// 期望的站点来源，Origin/Referer 必须以此为前缀
    pub expected_origin: String,
    /// CSRF 令牌有效期（秒），超过后视为不存在并重新铸造
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    /// 凭证校验的最小耗时下限（毫秒），所有分支都不早于该时间返回
    pub min_latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub logging: LoggingConfig,
    pub token: TokenConfig,
    pub password: PasswordConfig,
    pub rate_limit: RateLimitConfig,
    pub csrf: CsrfConfig,
    pub verifier: VerifierConfig,
}

impl AuthConfig {
    /// 从环境变量加载配置
    ///
    /// 除签名密钥（`AUTH_TOKEN__SECRET`）外所有配置项都有安全默认值；
    /// 密钥缺失时返回错误，进程不应继续启动。
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置（签名密钥除外）
        settings = settings
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("token.algorithm", "HS256")?
            .set_default("token.ttl_minutes", 30)?
            .set_default("password.min_length", 8)?
            .set_default("password.max_length", 64)?
            .set_default("password.require_uppercase", true)?
            .set_default("password.require_lowercase", true)?
            .set_default("password.require_digit", true)?
            .set_default("password.require_special", false)?
            .set_default("rate_limit.threshold", 5)?
            .set_default("rate_limit.window_secs", 3600)?
            .set_default("csrf.expected_origin", "http://localhost:8000")?
            .set_default("csrf.ttl_secs", 3600)?
            .set_default("verifier.min_latency_ms", 500)?;

        // 从环境变量加载配置（前缀为 AUTH_）
        settings = settings.add_source(
            Environment::with_prefix("AUTH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AuthConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证签名密钥长度（至少 32 字符）
        if self.token.secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "Signing secret must be at least 32 characters long".to_string(),
            ));
        }

        // 验证签名算法
        match self.token.algorithm.as_str() {
            "HS256" | "HS384" | "HS512" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid signing algorithm: {}. Must be one of: HS256, HS384, HS512",
                    self.token.algorithm
                )))
            }
        }

        // 验证令牌过期时间
        if self.token.ttl_minutes < 1 || self.token.ttl_minutes > 1440 {
            return Err(ConfigError::Message(
                "token.ttl_minutes must be between 1 and 1440 (1 minute to 24 hours)".to_string(),
            ));
        }

        // 验证密码策略
        if self.password.min_length < 6 || self.password.min_length > 128 {
            return Err(ConfigError::Message(
                "password.min_length must be between 6 and 128".to_string(),
            ));
        }
        if self.password.max_length < self.password.min_length {
            return Err(ConfigError::Message(
                "password.max_length must be >= password.min_length".to_string(),
            ));
        }

        // 验证限流配置
        if self.rate_limit.threshold < 1 || self.rate_limit.threshold > 100 {
            return Err(ConfigError::Message(
                "rate_limit.threshold must be between 1 and 100".to_string(),
            ));
        }
        if self.rate_limit.window_secs < 60 || self.rate_limit.window_secs > 86400 {
            return Err(ConfigError::Message(
                "rate_limit.window_secs must be between 60 and 86400".to_string(),
            ));
        }

        // 验证 CSRF 配置
        if self.csrf.expected_origin.trim().is_empty() {
            return Err(ConfigError::Message(
                "csrf.expected_origin must not be empty".to_string(),
            ));
        }
        if self.csrf.ttl_secs < 60 || self.csrf.ttl_secs > 604800 {
            return Err(ConfigError::Message(
                "csrf.ttl_secs must be between 60 and 604800 (1 minute to 7 days)".to_string(),
            ));
        }

        // 验证校验耗时下限（0 表示关闭，仅用于测试）
        if self.verifier.min_latency_ms > 5000 {
            return Err(ConfigError::Message(
                "verifier.min_latency_ms must be <= 5000".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_auth_env() {
        for (key, _) in std::env::vars() {
            if key.starts_with("AUTH_") {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_auth_env();

        // 设置必需的密钥
        std::env::set_var(
            "AUTH_TOKEN__SECRET",
            "test-secret-key-for-testing-only-min-32-chars",
        );

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.token.algorithm, "HS256");
        assert_eq!(config.token.ttl_minutes, 30);
        assert_eq!(config.rate_limit.threshold, 5);
        assert_eq!(config.rate_limit.window_secs, 3600);
        assert_eq!(config.password.min_length, 8);
        assert_eq!(config.password.max_length, 64);
        assert_eq!(config.verifier.min_latency_ms, 500);

        std::env::remove_var("AUTH_TOKEN__SECRET");
    }

    #[test]
    #[serial]
    fn test_config_fails_without_secret() {
        clear_auth_env();

        // 没有 AUTH_TOKEN__SECRET，加载必须失败
        let result = AuthConfig::from_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_config_rejects_short_secret() {
        clear_auth_env();

        std::env::set_var("AUTH_TOKEN__SECRET", "too-short");

        let result = AuthConfig::from_env();
        assert!(result.is_err());

        std::env::remove_var("AUTH_TOKEN__SECRET");
    }

    #[test]
    #[serial]
    fn test_config_rejects_unknown_algorithm() {
        clear_auth_env();

        std::env::set_var(
            "AUTH_TOKEN__SECRET",
            "test-secret-key-for-testing-only-min-32-chars",
        );
        std::env::set_var("AUTH_TOKEN__ALGORITHM", "RS256");

        let result = AuthConfig::from_env();
        assert!(result.is_err());

        std::env::remove_var("AUTH_TOKEN__SECRET");
        std::env::remove_var("AUTH_TOKEN__ALGORITHM");
    }

    #[test]
    #[serial]
    fn test_config_rejects_invalid_log_level() {
        clear_auth_env();

        std::env::set_var(
            "AUTH_TOKEN__SECRET",
            "test-secret-key-for-testing-only-min-32-chars",
        );
        std::env::set_var("AUTH_LOGGING__LEVEL", "verbose");

        let result = AuthConfig::from_env();
        assert!(result.is_err());

        std::env::remove_var("AUTH_TOKEN__SECRET");
        std::env::remove_var("AUTH_LOGGING__LEVEL");
    }

    #[test]
    #[serial]
    fn test_config_env_overrides() {
        clear_auth_env();

        std::env::set_var(
            "AUTH_TOKEN__SECRET",
            "test-secret-key-for-testing-only-min-32-chars",
        );
        std::env::set_var("AUTH_RATE_LIMIT__THRESHOLD", "3");
        std::env::set_var("AUTH_TOKEN__TTL_MINUTES", "5");

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.rate_limit.threshold, 3);
        assert_eq!(config.token.ttl_minutes, 5);

        std::env::remove_var("AUTH_TOKEN__SECRET");
        std::env::remove_var("AUTH_RATE_LIMIT__THRESHOLD");
        std::env::remove_var("AUTH_TOKEN__TTL_MINUTES");
    }
}
