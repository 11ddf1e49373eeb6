//! 数据模型模块
//! 认证核心只持有用户与认证请求/响应模型，业务实体归外部协作方所有

pub mod auth;
pub mod user;
