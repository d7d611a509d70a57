use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 考勤状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/app/types/generated/attendance.ts")]
pub enum AttendanceStatus {
    Present, // 出勤
    Late,    // 迟到（时长达标）
    Partial, // 时长不足
    Absent,  // 缺勤
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "present"),
            AttendanceStatus::Late => write!(f, "late"),
            AttendanceStatus::Partial => write!(f, "partial"),
            AttendanceStatus::Absent => write!(f, "absent"),
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "late" => Ok(AttendanceStatus::Late),
            "partial" => Ok(AttendanceStatus::Partial),
            "absent" => Ok(AttendanceStatus::Absent),
            _ => Err(format!("Invalid attendance status: {s}")),
        }
    }
}

/// 一次连续的入会区间
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/attendance.ts")]
pub struct AttendanceSession {
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
}

impl AttendanceSession {
    pub fn open(joined_at: DateTime<Utc>) -> Self {
        Self {
            joined_at,
            left_at: None,
            duration_seconds: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

// 考勤记录实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/attendance.ts")]
pub struct Attendance {
    pub id: i64,
    pub meeting_id: i64,
    pub student_id: i64,
    pub sessions: Vec<AttendanceSession>,
    pub first_joined_at: Option<DateTime<Utc>>,
    pub last_left_at: Option<DateTime<Utc>>,
    pub total_duration_seconds: i64,
    pub attendance_percentage: f64,
    pub is_late: bool,
    pub status: AttendanceStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
