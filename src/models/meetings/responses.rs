use serde::Serialize;
use ts_rs::TS;

use super::entities::Meeting;
use crate::models::common::pagination::PaginationInfo;

/// 会议详情（附参会学生）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/meeting.ts")]
pub struct MeetingDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub meeting: Meeting,
    pub participant_ids: Vec<i64>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/meeting.ts")]
pub struct MeetingListResponse {
    pub items: Vec<Meeting>,
    pub pagination: PaginationInfo,
}
