use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use super::entities::MeetingStatus;
use crate::models::common::PaginationQuery;

// 创建会议请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/meeting.ts")]
pub struct CreateMeetingRequest {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i32,
    #[serde(default)]
    pub participant_ids: Vec<i64>,
}

// 添加参会学生请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/meeting.ts")]
pub struct AddParticipantsRequest {
    pub participant_ids: Vec<i64>,
}

// 会议列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/meeting.ts")]
pub struct MeetingListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub status: Option<MeetingStatus>,
}

/// 会议列表的可见范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingScope {
    All,
    HostedBy(i64),
    InvitedUser(i64),
}

// 会议列表查询参数（用于存储层）
#[derive(Debug, Clone)]
pub struct MeetingListQuery {
    pub page: u64,
    pub size: u64,
    pub scope: MeetingScope,
    pub status: Option<MeetingStatus>,
}

// 存储层创建会议参数
#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub host_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub room_code: String,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i32,
    pub participant_ids: Vec<i64>,
}
