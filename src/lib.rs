//! 认证核心库
//! 提供密码哈希、凭证校验、CSRF 防护、会话令牌与登录/注册限流能力

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;
