use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::PaginationQuery;

// 我的考勤历史查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/attendance.ts")]
pub struct MyAttendanceParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
}
