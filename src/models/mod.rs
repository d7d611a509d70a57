//! 数据模型定义
//!
//! 每个业务模块按 `entities`（业务实体）、`requests`（请求体与查询参数）、
//! `responses`（响应体）拆分。

pub mod attendance;
pub mod auth;
pub mod common;
pub mod emotions;
pub mod meetings;
pub mod notifications;
pub mod system;
pub mod users;

pub use common::{
    ApiResponse, ErrorCode, PaginatedResponse, PaginationInfo, PaginationQuery,
};

/// 程序启动时间，用于计算运行时长
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
