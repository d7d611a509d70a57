use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, rt, web};
use serde::Deserialize;
use tracing::info;

use crate::middlewares::require_jwt::load_user;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{WebSocketService, cache_from_request, storage_from_request};
use crate::utils::jwt::JwtUtils;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

fn unauthorized(message: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(ErrorCode::Unauthorized, message))
}

/// 浏览器的 WebSocket 无法携带 Authorization 头，令牌通过查询参数传入
pub async fn websocket(
    req: HttpRequest,
    body: web::Payload,
    query: web::Query<WsQuery>,
) -> ActixResult<HttpResponse> {
    let Some(token) = query.token.as_deref().filter(|t| !t.is_empty()) else {
        return Ok(unauthorized("缺少访问令牌"));
    };
    let Some(user_id) = JwtUtils::verify_access_token(token)
        .ok()
        .and_then(|claims| claims.user_id())
    else {
        return Ok(unauthorized("无效或已过期的访问令牌"));
    };

    let storage = match storage_from_request(&req) {
        Ok(storage) => storage,
        Err(e) => return Ok(e.to_http_response()),
    };
    let cache = match cache_from_request(&req) {
        Ok(cache) => cache,
        Err(e) => return Ok(e.to_http_response()),
    };
    let user = match load_user(user_id, &storage, &cache).await {
        Ok(Some(user)) if user.is_approved() => user,
        Ok(Some(_)) => {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::AccountNotApproved,
                "账号尚未通过审核",
            )));
        }
        Ok(None) => return Ok(unauthorized("用户不存在")),
        Err(e) => return Ok(e.to_http_response()),
    };

    let (response, session, stream) = actix_ws::handle(&req, body)?;
    info!("WebSocket upgrade accepted for user {}", user.id);
    rt::spawn(WebSocketService::handle_connection(user.id, session, stream));

    Ok(response)
}

pub fn configure_websocket_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/v1/ws", web::get().to(websocket));
}
