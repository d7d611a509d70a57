use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::emotions::requests::RecordEmotionRequest;
use crate::services::EmotionService;
use crate::utils::SafeIDI64;

static EMOTION_SERVICE: Lazy<EmotionService> = Lazy::new(EmotionService::new_lazy);

// 挂在 /api/v1/meetings/{id} 下，见 meetings.rs

pub async fn record_sample(
    req: HttpRequest,
    meeting_id: SafeIDI64,
    sample: web::Json<RecordEmotionRequest>,
) -> ActixResult<HttpResponse> {
    EMOTION_SERVICE
        .record_sample(&req, meeting_id.0, sample.into_inner())
        .await
}

pub async fn meeting_summary(req: HttpRequest, meeting_id: SafeIDI64) -> ActixResult<HttpResponse> {
    EMOTION_SERVICE.meeting_summary(&req, meeting_id.0).await
}
