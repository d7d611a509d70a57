//! Smart LMS - 在线教学平台后端服务
//!
//! 基于 Actix Web 的直播课堂后端：会议排期与状态流转、学生入会/离会的考勤会话记账、
//! 客户端表情采样的专注度统计，以及站内通知与 WebSocket 实时推送。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis）
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证授权中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层（考勤记账见 `services::attendance::ledger`）
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
