use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/system.ts")]
pub struct SystemInfoResponse {
    pub name: String,                // 服务名称
    pub version: String,             // 版本号
    pub environment: String,         // 运行环境
    pub uptime_seconds: i64,         // 运行时长（秒）
    pub online_users: usize,         // WebSocket 在线用户数
    pub started_at: chrono::DateTime<chrono::Utc>,
}
