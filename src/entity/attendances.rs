//! 考勤记录实体
//!
//! `sessions` 以 JSON 文本存储入会区间列表，`version` 用于条件更新。

use sea_orm::entity::prelude::*;

use crate::models::attendance::entities::AttendanceSession;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attendances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub meeting_id: i64,
    pub student_id: i64,
    #[sea_orm(column_type = "Text")]
    pub sessions: String,
    pub first_joined_at: Option<i64>,
    pub last_left_at: Option<i64>,
    pub total_duration_seconds: i64,
    #[sea_orm(column_type = "Double")]
    pub attendance_percentage: f64,
    pub is_late: bool,
    pub status: String,
    pub version: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meetings::Entity",
        from = "Column::MeetingId",
        to = "super::meetings::Column::Id"
    )]
    Meeting,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Id"
    )]
    Student,
}

impl Related<super::meetings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meeting.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 解析会话列表，损坏的数据视为空列表
    pub fn parse_sessions(&self) -> Vec<AttendanceSession> {
        serde_json::from_str(&self.sessions).unwrap_or_default()
    }

    pub fn into_attendance(self) -> crate::models::attendance::entities::Attendance {
        use crate::models::attendance::entities::{Attendance, AttendanceStatus};

        let sessions = self.parse_sessions();
        let is_active = sessions.iter().any(AttendanceSession::is_active);

        Attendance {
            id: self.id,
            meeting_id: self.meeting_id,
            student_id: self.student_id,
            sessions,
            first_joined_at: self.first_joined_at.map(super::ts_to_datetime),
            last_left_at: self.last_left_at.map(super::ts_to_datetime),
            total_duration_seconds: self.total_duration_seconds,
            attendance_percentage: self.attendance_percentage,
            is_late: self.is_late,
            status: self
                .status
                .parse::<AttendanceStatus>()
                .unwrap_or(AttendanceStatus::Absent),
            is_active,
            created_at: super::ts_to_datetime(self.created_at),
            updated_at: super::ts_to_datetime(self.updated_at),
        }
    }
}
