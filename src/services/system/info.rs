use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use chrono::{DateTime, Utc};

use super::SystemService;
use crate::models::system::responses::SystemInfoResponse;
use crate::models::{AppStartTime, ApiResponse};
use crate::services::websocket::get_online_count;

pub(crate) fn uptime_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_seconds().max(0)
}

pub async fn get_system_info(
    service: &SystemService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let config = service.get_config();
    let started_at = request
        .app_data::<web::Data<AppStartTime>>()
        .map(|start| start.start_datetime)
        .unwrap_or_else(Utc::now);

    let info = SystemInfoResponse {
        name: config.app.system_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: config.app.environment.clone(),
        uptime_seconds: uptime_seconds(started_at, Utc::now()),
        online_users: get_online_count(),
        started_at,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(info, "查询成功")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_uptime_never_negative() {
        let now = Utc::now();
        assert_eq!(uptime_seconds(now - TimeDelta::seconds(90), now), 90);
        assert_eq!(uptime_seconds(now + TimeDelta::seconds(5), now), 0);
    }
}
