//! AlloyDB 查询 Webhook 公共模块
//!
//! 包含：
//! - 配置加载（服务与数据库连接器）
//! - 统一错误类型
//! - 对话平台 Webhook 请求/响应模型
//! - 请求 ID 中间件

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
