//! 统一错误模型
//! 定义认证核心的错误类型和对外错误响应格式

use serde::Serialize;
use thiserror::Error;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AuthError>;

/// 认证核心错误类型
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Too many attempts")]
    RateLimited,

    /// 身份不存在与密码错误统一为同一种错误，不向调用方区分
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    #[error("Account already exists")]
    AlreadyExists,

    #[error("CSRF validation failed")]
    CsrfRejected,

    /// 过期、签名错误、声明不匹配统一为同一种错误，不向调用方区分
    #[error("Invalid token")]
    TokenInvalid,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::RateLimited => 429,
            AuthError::InvalidCredentials => 401,
            AuthError::ValidationFailed { .. } => 400,
            AuthError::AlreadyExists => 409,
            AuthError::CsrfRejected => 403,
            AuthError::TokenInvalid => 401,
            AuthError::Config(_) | AuthError::Store(_) | AuthError::Internal(_) => 500,
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AuthError::RateLimited => "Too many attempts. Please try again later.".to_string(),
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::ValidationFailed { reason, .. } => reason.clone(),
            AuthError::AlreadyExists => "Email already registered".to_string(),
            AuthError::CsrfRejected => "Invalid CSRF token".to_string(),
            AuthError::TokenInvalid => "Invalid or expired session".to_string(),
            AuthError::Config(_) => "Configuration error".to_string(),
            AuthError::Store(_) => "Storage error occurred".to_string(),
            AuthError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code()
    }

    // 便捷方法
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        AuthError::ValidationFailed {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        AuthError::Store(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        AuthError::Internal(msg.into())
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl AuthError {
    /// 构建边界层可直接序列化返回的错误响应体
    pub fn to_error_response(&self) -> ErrorResponse {
        let request_id = uuid::Uuid::new_v4().to_string();

        // 记录错误日志
        tracing::error!(
            code = self.code(),
            message = %self,
            request_id = %request_id,
            "Authentication error"
        );

        ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
            },
        }
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AuthError {
    fn from(e: config::ConfigError) -> Self {
        AuthError::Config(e.to_string())
    }
}

impl From<crate::store::StoreError> for AuthError {
    fn from(e: crate::store::StoreError) -> Self {
        AuthError::Store(e.to_string())
    }
}
