use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::info;

use super::AttendanceService;
use super::ledger::JoinOutcome;
use crate::config::AppConfig;
use crate::models::attendance::responses::AttendanceActionResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::services::meetings::access::{ensure_live, ensure_participant, load_meeting};
use crate::services::websocket::{AttendanceAction, AttendanceUpdatePayload, push_attendance_update};

fn meeting_closed() -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::MeetingNotLive,
        "会议已不在进行中",
    ))
}

pub async fn join_meeting(
    service: &AttendanceService,
    request: &HttpRequest,
    meeting_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let meeting = match load_meeting(&storage, meeting_id).await {
        Ok(meeting) => meeting,
        Err(response) => return Ok(response),
    };
    if let Err(response) = ensure_participant(&storage, &meeting, &user).await {
        return Ok(response);
    }
    if let Err(response) = ensure_live(&meeting) {
        return Ok(response);
    }

    let now = Utc::now();
    let joined = try_response!(
        storage
            .join_meeting(
                meeting.id,
                user.id,
                meeting.window(),
                AppConfig::get().attendance.policy(),
                now,
            )
            .await
    );
    // 读取会议之后会议已被结束
    let Some((attendance, outcome)) = joined else {
        return Ok(meeting_closed());
    };

    let session_opened = outcome == JoinOutcome::Opened;
    if session_opened {
        info!(
            "Student {} joined meeting {} (session #{})",
            user.id,
            meeting.id,
            attendance.sessions.len()
        );
        push_attendance_update(
            meeting.host_id,
            AttendanceUpdatePayload::new(&attendance, AttendanceAction::Join, now),
        );
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AttendanceActionResponse {
            attendance,
            session_opened,
        },
        if session_opened { "已入会" } else { "已在会议中" },
    )))
}

pub async fn leave_meeting(
    service: &AttendanceService,
    request: &HttpRequest,
    meeting_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let meeting = match load_meeting(&storage, meeting_id).await {
        Ok(meeting) => meeting,
        Err(response) => return Ok(response),
    };
    if let Err(response) = ensure_participant(&storage, &meeting, &user).await {
        return Ok(response);
    }
    // 会议结束时所有会话已被结算关闭
    if let Err(response) = ensure_live(&meeting) {
        return Ok(response);
    }

    let now = Utc::now();
    let attendance = match storage
        .leave_meeting(
            meeting.id,
            user.id,
            meeting.window(),
            AppConfig::get().attendance.policy(),
            now,
        )
        .await
    {
        Ok(Some(attendance)) => attendance,
        Ok(None) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::AttendanceNoActiveSession,
                "当前没有进行中的入会记录",
            )));
        }
        Err(e) => return Ok(e.to_http_response()),
    };

    info!(
        "Student {} left meeting {}, total {}s ({:.2}%)",
        user.id, meeting.id, attendance.total_duration_seconds, attendance.attendance_percentage
    );
    push_attendance_update(
        meeting.host_id,
        AttendanceUpdatePayload::new(&attendance, AttendanceAction::Leave, now),
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AttendanceActionResponse {
            attendance,
            session_opened: false,
        },
        "已离会",
    )))
}
