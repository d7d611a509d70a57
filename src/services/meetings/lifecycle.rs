//! 会议状态迁移：scheduled -> live -> ended，scheduled -> cancelled

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::{error, info};

use super::MeetingService;
use super::access::{ensure_manager, load_meeting};
use crate::config::AppConfig;
use crate::models::meetings::entities::{Meeting, MeetingStatus};
use crate::models::meetings::responses::MeetingDetail;
use crate::models::notifications::entities::{NotificationType, ReferenceType};
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::services::notifications::dispatch::{NotificationDraft, notify_users};
use crate::storage::Storage;

fn invalid_transition(from: MeetingStatus, to: MeetingStatus) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::MeetingInvalidTransition,
        format!("会议不能从 {from} 变为 {to}"),
    ))
}

/// 校验权限后执行条件迁移，返回迁移后的会议
async fn transition(
    storage: &std::sync::Arc<dyn Storage>,
    user: &User,
    meeting_id: i64,
    to: MeetingStatus,
) -> Result<Meeting, HttpResponse> {
    let meeting = load_meeting(storage, meeting_id).await?;
    ensure_manager(&meeting, user)?;

    let from = meeting.status;
    if !from.can_transition_to(to) {
        return Err(invalid_transition(from, to));
    }

    match storage
        .transition_meeting_status(meeting.id, from, to, Utc::now())
        .await
    {
        Ok(Some(updated)) => {
            info!(
                "Meeting {} moved {} -> {} by user {}",
                updated.id, from, to, user.id
            );
            Ok(updated)
        }
        // 并发请求已先一步改变了状态
        Ok(None) => {
            let current = load_meeting(storage, meeting_id).await?;
            Err(invalid_transition(current.status, to))
        }
        Err(e) => Err(e.to_http_response()),
    }
}

fn lifecycle_notification(meeting: &Meeting) -> Option<NotificationDraft> {
    let draft = match meeting.status {
        MeetingStatus::Live => NotificationDraft::new(NotificationType::MeetingStarted, "会议已开始")
            .content(format!("《{}》正在进行，请及时入会", meeting.title)),
        MeetingStatus::Ended => NotificationDraft::new(NotificationType::MeetingEnded, "会议已结束")
            .content(format!("《{}》已结束，可以查看考勤记录", meeting.title)),
        MeetingStatus::Cancelled => {
            NotificationDraft::new(NotificationType::MeetingCancelled, "会议已取消")
                .content(format!("《{}》已被取消", meeting.title))
        }
        MeetingStatus::Scheduled => return None,
    };
    Some(draft.reference(ReferenceType::Meeting, meeting.id))
}

async fn respond_with_detail(
    storage: &std::sync::Arc<dyn Storage>,
    meeting: Meeting,
    message: &str,
) -> ActixResult<HttpResponse> {
    let participant_ids = try_response!(storage.list_meeting_participant_ids(meeting.id).await);

    if let Some(draft) = lifecycle_notification(&meeting) {
        notify_users(storage, &participant_ids, draft).await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        MeetingDetail {
            meeting,
            participant_ids,
        },
        message,
    )))
}

pub async fn start_meeting(
    service: &MeetingService,
    request: &HttpRequest,
    meeting_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    match transition(&storage, &user, meeting_id, MeetingStatus::Live).await {
        Ok(meeting) => respond_with_detail(&storage, meeting, "会议已开始").await,
        Err(response) => Ok(response),
    }
}

/// 已结束的会议允许再次结算，上次结算失败时由此补救
fn end_requires_transition(status: MeetingStatus) -> bool {
    status != MeetingStatus::Ended
}

pub async fn end_meeting(
    service: &MeetingService,
    request: &HttpRequest,
    meeting_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let current = match load_meeting(&storage, meeting_id).await {
        Ok(meeting) => meeting,
        Err(response) => return Ok(response),
    };

    let (meeting, newly_ended) = if end_requires_transition(current.status) {
        match transition(&storage, &user, meeting_id, MeetingStatus::Ended).await {
            Ok(meeting) => (meeting, true),
            Err(response) => return Ok(response),
        }
    } else {
        if let Err(response) = ensure_manager(&current, &user) {
            return Ok(response);
        }
        (current, false)
    };

    // 结算考勤：关闭仍在进行的会话，未入会的受邀学生记为缺勤
    let ended_at = meeting.ended_at.unwrap_or_else(Utc::now);
    let participant_ids = try_response!(storage.list_meeting_participant_ids(meeting.id).await);
    match storage
        .finalize_meeting_attendance(
            meeting.id,
            &participant_ids,
            meeting.window(),
            AppConfig::get().attendance.policy(),
            ended_at,
        )
        .await
    {
        Ok(closed) => info!(
            "Meeting {} attendance finalized, {} open sessions closed",
            meeting.id, closed
        ),
        Err(e) => {
            error!("Failed to finalize attendance for meeting {}: {}", meeting.id, e);
            return Ok(e.to_http_response());
        }
    }

    if newly_ended {
        respond_with_detail(&storage, meeting, "会议已结束").await
    } else {
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            MeetingDetail {
                meeting,
                participant_ids,
            },
            "会议考勤已重新结算",
        )))
    }
}

pub async fn cancel_meeting(
    service: &MeetingService,
    request: &HttpRequest,
    meeting_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    match transition(&storage, &user, meeting_id, MeetingStatus::Cancelled).await {
        Ok(meeting) => respond_with_detail(&storage, meeting, "会议已取消").await,
        Err(response) => Ok(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meeting(status: MeetingStatus) -> Meeting {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        Meeting {
            id: 5,
            host_id: 1,
            title: "操作系统".into(),
            description: None,
            room_code: "ABC-DEF-GHJ".into(),
            status,
            scheduled_start: at,
            duration_minutes: 90,
            started_at: None,
            ended_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_lifecycle_notification_types() {
        let kind = |status| lifecycle_notification(&meeting(status)).map(|d| d.notification_type);
        assert_eq!(kind(MeetingStatus::Live), Some(NotificationType::MeetingStarted));
        assert_eq!(kind(MeetingStatus::Ended), Some(NotificationType::MeetingEnded));
        assert_eq!(kind(MeetingStatus::Cancelled), Some(NotificationType::MeetingCancelled));
        assert_eq!(kind(MeetingStatus::Scheduled), None);

        let draft = lifecycle_notification(&meeting(MeetingStatus::Live)).unwrap();
        assert_eq!(draft.reference_id, Some(5));
    }

    #[test]
    fn test_ended_meeting_is_finalized_without_transition() {
        assert!(end_requires_transition(MeetingStatus::Live));
        assert!(end_requires_transition(MeetingStatus::Scheduled));
        assert!(!end_requires_transition(MeetingStatus::Ended));
    }
}
