use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::attendance::requests::MyAttendanceParams;
use crate::services::AttendanceService;
use crate::utils::SafeIDI64;

static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

// 以下处理程序挂在 /api/v1/meetings/{id} 下，见 meetings.rs

pub async fn join_meeting(req: HttpRequest, meeting_id: SafeIDI64) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.join(&req, meeting_id.0).await
}

pub async fn leave_meeting(req: HttpRequest, meeting_id: SafeIDI64) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.leave(&req, meeting_id.0).await
}

pub async fn meeting_report(req: HttpRequest, meeting_id: SafeIDI64) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.meeting_report(&req, meeting_id.0).await
}

pub async fn my_meeting_record(
    req: HttpRequest,
    meeting_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.my_meeting_record(&req, meeting_id.0).await
}

pub async fn my_history(
    req: HttpRequest,
    query: web::Query<MyAttendanceParams>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.my_history(&req, query.into_inner()).await
}

pub fn configure_attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attendance")
            .wrap(middlewares::RequireJWT)
            .route("/my", web::get().to(my_history)),
    );
}
