use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::MeetingService;
use super::access::{ensure_manager, load_meeting, resolve_participants};
use crate::models::meetings::requests::AddParticipantsRequest;
use crate::models::meetings::responses::MeetingDetail;
use crate::models::notifications::entities::{NotificationType, ReferenceType};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::services::notifications::dispatch::{NotificationDraft, notify_users};

pub async fn add_participants(
    service: &MeetingService,
    request: &HttpRequest,
    meeting_id: i64,
    add: AddParticipantsRequest,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let meeting = match load_meeting(&storage, meeting_id).await {
        Ok(meeting) => meeting,
        Err(response) => return Ok(response),
    };
    if let Err(response) = ensure_manager(&meeting, &user) {
        return Ok(response);
    }
    if meeting.status.is_finished() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::MeetingInvalidTransition,
            "会议已结束或已取消，不能再添加参会学生",
        )));
    }

    let requested = match resolve_participants(&storage, &add.participant_ids).await {
        Ok(ids) => ids,
        Err(response) => return Ok(response),
    };
    if requested.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::MeetingInvalidParticipants,
            "参会学生列表不能为空",
        )));
    }

    let existing = try_response!(storage.list_meeting_participant_ids(meeting.id).await);
    let newly_invited: Vec<i64> = requested
        .into_iter()
        .filter(|id| !existing.contains(id))
        .collect();
    let added = try_response!(storage.add_meeting_participants(meeting.id, &newly_invited).await);
    info!("Added {} participants to meeting {}", added, meeting.id);

    notify_users(
        &storage,
        &newly_invited,
        NotificationDraft::new(NotificationType::MeetingScheduled, "新的会议安排")
            .content(format!("你已被邀请参加《{}》", meeting.title))
            .reference(ReferenceType::Meeting, meeting.id),
    )
    .await;

    let participant_ids = try_response!(storage.list_meeting_participant_ids(meeting.id).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        MeetingDetail {
            meeting,
            participant_ids,
        },
        format!("已添加 {added} 名参会学生"),
    )))
}
