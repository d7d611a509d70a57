use serde::Serialize;
use ts_rs::TS;

use super::entities::Attendance;
use crate::models::common::pagination::PaginationInfo;

/// 入会/离会操作结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/attendance.ts")]
pub struct AttendanceActionResponse {
    pub attendance: Attendance,
    /// 本次入会是否新开了会话（已在会中时为 false）
    pub session_opened: bool,
}

/// 会议考勤汇总
#[derive(Debug, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/attendance.ts")]
pub struct AttendanceSummary {
    pub total_participants: i64,
    pub present_count: i64,
    pub late_count: i64,
    pub partial_count: i64,
    pub absent_count: i64,
    pub currently_active: i64,
    pub average_percentage: f64,
}

/// 会议考勤报表
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/attendance.ts")]
pub struct MeetingAttendanceResponse {
    pub meeting_id: i64,
    pub records: Vec<Attendance>,
    pub summary: AttendanceSummary,
}

/// 学生考勤历史
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/attendance.ts")]
pub struct AttendanceListResponse {
    pub items: Vec<Attendance>,
    pub pagination: PaginationInfo,
}
