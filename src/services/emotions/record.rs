use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::EmotionService;
use super::scoring::{attentiveness, dominant_emotion, validate_scores};
use crate::models::emotions::requests::{NewEmotionSample, RecordEmotionRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::services::meetings::access::{ensure_live, ensure_participant, load_meeting};
use crate::services::websocket::{EmotionUpdatePayload, push_emotion_update};

pub async fn record_sample(
    service: &EmotionService,
    request: &HttpRequest,
    meeting_id: i64,
    sample: RecordEmotionRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_scores(&sample.expressions) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::EmotionSampleInvalid, msg)));
    }

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

    let new_sample = NewEmotionSample {
        meeting_id: meeting.id,
        student_id: user.id,
        dominant_emotion: dominant_emotion(&sample.expressions),
        attentiveness: attentiveness(&sample.expressions, sample.face_detected),
        expressions: sample.expressions,
        face_detected: sample.face_detected,
    };

    let Some(saved) = try_response!(storage.create_emotion_sample(new_sample).await) else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::MeetingNotLive,
            "会议已不在进行中",
        )));
    };
    debug!(
        "Emotion sample for student {} in meeting {}: {} ({:.2})",
        saved.student_id, saved.meeting_id, saved.dominant_emotion, saved.attentiveness
    );
    push_emotion_update(meeting.host_id, EmotionUpdatePayload::from(&saved));

    Ok(HttpResponse::Created().json(ApiResponse::success(saved, "采样已记录")))
}
