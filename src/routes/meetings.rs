use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use super::{attendance, emotions};
use crate::middlewares::{self, RateLimit};
use crate::models::meetings::requests::{
    AddParticipantsRequest, CreateMeetingRequest, MeetingListParams,
};
use crate::models::users::entities::UserRole;
use crate::services::MeetingService;
use crate::utils::SafeIDI64;

static MEETING_SERVICE: Lazy<MeetingService> = Lazy::new(MeetingService::new_lazy);

pub async fn list_meetings(
    req: HttpRequest,
    query: web::Query<MeetingListParams>,
) -> ActixResult<HttpResponse> {
    MEETING_SERVICE.list_meetings(&req, query.into_inner()).await
}

pub async fn create_meeting(
    req: HttpRequest,
    create: web::Json<CreateMeetingRequest>,
) -> ActixResult<HttpResponse> {
    MEETING_SERVICE.create_meeting(&req, create.into_inner()).await
}

pub async fn get_meeting(req: HttpRequest, meeting_id: SafeIDI64) -> ActixResult<HttpResponse> {
    MEETING_SERVICE.get_meeting(&req, meeting_id.0).await
}

pub async fn add_participants(
    req: HttpRequest,
    meeting_id: SafeIDI64,
    add: web::Json<AddParticipantsRequest>,
) -> ActixResult<HttpResponse> {
    MEETING_SERVICE
        .add_participants(&req, meeting_id.0, add.into_inner())
        .await
}

pub async fn start_meeting(req: HttpRequest, meeting_id: SafeIDI64) -> ActixResult<HttpResponse> {
    MEETING_SERVICE.start_meeting(&req, meeting_id.0).await
}

pub async fn end_meeting(req: HttpRequest, meeting_id: SafeIDI64) -> ActixResult<HttpResponse> {
    MEETING_SERVICE.end_meeting(&req, meeting_id.0).await
}

pub async fn cancel_meeting(req: HttpRequest, meeting_id: SafeIDI64) -> ActixResult<HttpResponse> {
    MEETING_SERVICE.cancel_meeting(&req, meeting_id.0).await
}

// 配置路由
pub fn configure_meeting_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/meetings")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_meetings))
            .service(
                web::resource("")
                    .guard(guard::Post())
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::post().to(create_meeting)),
            )
            .route("/{id}", web::get().to(get_meeting))
            .route("/{id}/participants", web::post().to(add_participants))
            .route("/{id}/start", web::post().to(start_meeting))
            .route("/{id}/end", web::post().to(end_meeting))
            .route("/{id}/cancel", web::post().to(cancel_meeting))
            // 考勤
            .route("/{id}/join", web::post().to(attendance::join_meeting))
            .route("/{id}/leave", web::post().to(attendance::leave_meeting))
            .route("/{id}/attendance", web::get().to(attendance::meeting_report))
            .route(
                "/{id}/attendance/me",
                web::get().to(attendance::my_meeting_record),
            )
            // 表情采样
            .service(
                web::resource("/{id}/emotions")
                    .wrap(RateLimit::emotion_samples())
                    .route(web::post().to(emotions::record_sample)),
            )
            .route(
                "/{id}/emotions/summary",
                web::get().to(emotions::meeting_summary),
            ),
    );
}
