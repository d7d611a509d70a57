use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::MeetingService;
use super::access::{ensure_viewer, load_meeting};
use crate::models::ApiResponse;
use crate::models::meetings::responses::MeetingDetail;
use crate::services::current_user;

pub async fn get_meeting(
    service: &MeetingService,
    request: &HttpRequest,
    meeting_id: i64,
) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    let storage = try_response!(service.get_storage(request));

    let meeting = match load_meeting(&storage, meeting_id).await {
        Ok(meeting) => meeting,
        Err(response) => return Ok(response),
    };
    if let Err(response) = ensure_viewer(&storage, &meeting, &user).await {
        return Ok(response);
    }

    let participant_ids = try_response!(storage.list_meeting_participant_ids(meeting.id).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        MeetingDetail {
            meeting,
            participant_ids,
        },
        "查询成功",
    )))
}
