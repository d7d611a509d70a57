use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::MeetingService;
use super::access::resolve_participants;
use crate::errors::LmsError;
use crate::models::meetings::entities::Meeting;
use crate::models::meetings::requests::{CreateMeetingRequest, NewMeeting};
use crate::models::meetings::responses::MeetingDetail;
use crate::models::notifications::entities::{NotificationType, ReferenceType};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::services::notifications::dispatch::{NotificationDraft, notify_users};
use crate::storage::Storage;
use crate::utils::random_code::generate_room_code;
use crate::utils::validate::{validate_meeting_duration, validate_meeting_title};

/// 房间号冲突时的重试次数
const ROOM_CODE_ATTEMPTS: usize = 5;

pub async fn create_meeting(
    service: &MeetingService,
    request: &HttpRequest,
    create: CreateMeetingRequest,
) -> ActixResult<HttpResponse> {
    let host = try_response!(current_user(request));

    let title = create.title.trim().to_string();
    if let Err(msg) = validate_meeting_title(&title) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
    }
    if let Err(msg) = validate_meeting_duration(create.duration_minutes) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
    }

    let storage = try_response!(service.get_storage(request));
    let participant_ids = match resolve_participants(&storage, &create.participant_ids).await {
        Ok(ids) => ids,
        Err(response) => return Ok(response),
    };

    let new_meeting = NewMeeting {
        host_id: host.id,
        title,
        description: create
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        room_code: String::new(),
        scheduled_start: create.scheduled_start,
        duration_minutes: create.duration_minutes,
        participant_ids: participant_ids.clone(),
    };

    let meeting = try_response!(insert_with_room_code(&storage, new_meeting).await);
    info!(
        "Meeting {} ({}) created by {} with {} participants",
        meeting.id,
        meeting.room_code,
        host.id,
        participant_ids.len()
    );

    notify_users(
        &storage,
        &participant_ids,
        NotificationDraft::new(NotificationType::MeetingScheduled, "新的会议安排")
            .content(format!(
                "《{}》将于 {} 开始，时长 {} 分钟",
                meeting.title,
                meeting.scheduled_start.format("%Y-%m-%d %H:%M UTC"),
                meeting.duration_minutes
            ))
            .reference(ReferenceType::Meeting, meeting.id),
    )
    .await;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        MeetingDetail {
            meeting,
            participant_ids,
        },
        "会议创建成功",
    )))
}

async fn insert_with_room_code(
    storage: &std::sync::Arc<dyn Storage>,
    mut new_meeting: NewMeeting,
) -> Result<Meeting, LmsError> {
    let mut last_error = LmsError::conflict("无法生成唯一的会议房间号");
    for _ in 0..ROOM_CODE_ATTEMPTS {
        new_meeting.room_code = generate_room_code();
        match storage.create_meeting(new_meeting.clone()).await {
            Ok(meeting) => return Ok(meeting),
            Err(e @ LmsError::Conflict(_)) => {
                warn!("Room code {} already taken, retrying", new_meeting.room_code);
                last_error = e;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_error)
}
