//! 会议访问控制，考勤与表情服务共用。
//!
//! 检查失败时直接给出错误响应，处理函数用 `if let Err(response)` 提前返回。

use actix_web::HttpResponse;
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::meetings::entities::{Meeting, MeetingStatus};
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub(crate) async fn load_meeting(
    storage: &Arc<dyn Storage>,
    meeting_id: i64,
) -> Result<Meeting, HttpResponse> {
    match storage.get_meeting_by_id(meeting_id).await {
        Ok(Some(meeting)) => Ok(meeting),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::MeetingNotFound,
            "会议不存在",
        ))),
        Err(e) => Err(e.to_http_response()),
    }
}

/// 主持人或管理员
pub(crate) fn can_manage(meeting: &Meeting, user: &User) -> bool {
    user.is_admin() || meeting.is_hosted_by(user.id)
}

pub(crate) fn ensure_manager(meeting: &Meeting, user: &User) -> Result<(), HttpResponse> {
    if can_manage(meeting, user) {
        Ok(())
    } else {
        Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::MeetingPermissionDenied,
            "只有会议主持人或管理员可以执行此操作",
        )))
    }
}

/// 受邀学生
pub(crate) async fn ensure_participant(
    storage: &Arc<dyn Storage>,
    meeting: &Meeting,
    user: &User,
) -> Result<(), HttpResponse> {
    let invited = user.role == UserRole::Student
        && storage
            .is_meeting_participant(meeting.id, user.id)
            .await
            .map_err(|e| e.to_http_response())?;
    if invited {
        Ok(())
    } else {
        Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::MeetingNotParticipant,
            "你不在该会议的参会名单中",
        )))
    }
}

/// 主持人、管理员或受邀学生
pub(crate) async fn ensure_viewer(
    storage: &Arc<dyn Storage>,
    meeting: &Meeting,
    user: &User,
) -> Result<(), HttpResponse> {
    if can_manage(meeting, user) {
        return Ok(());
    }
    ensure_participant(storage, meeting, user).await
}

pub(crate) fn ensure_live(meeting: &Meeting) -> Result<(), HttpResponse> {
    if meeting.status == MeetingStatus::Live {
        Ok(())
    } else {
        Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::MeetingNotLive,
            format!("会议当前状态为 {}，未在进行中", meeting.status),
        )))
    }
}

/// 参会名单必须全部是已审核的学生，返回去重后的 ID
pub(crate) async fn resolve_participants(
    storage: &Arc<dyn Storage>,
    ids: &[i64],
) -> Result<Vec<i64>, HttpResponse> {
    let mut seen = HashSet::new();
    let unique: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if unique.is_empty() {
        return Ok(unique);
    }

    let students = storage
        .list_approved_students_by_ids(&unique)
        .await
        .map_err(|e| e.to_http_response())?;
    let found: HashSet<i64> = students.iter().map(|u| u.id).collect();
    let missing: Vec<String> = unique
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();

    if missing.is_empty() {
        Ok(unique)
    } else {
        Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::MeetingInvalidParticipants,
            format!("以下用户不是已审核的学生: {}", missing.join(", ")),
        )))
    }
}
