//! JSON 请求体与查询参数的解析错误处理

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{Error, HttpRequest, HttpResponse};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

fn bad_request(message: String) -> Error {
    let response =
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, &message));
    InternalError::from_response(message, response).into()
}

pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    debug!("JSON 解析失败 {}: {}", req.path(), err);
    let message = match &err {
        JsonPayloadError::ContentType => "请求头 Content-Type 必须为 application/json".to_string(),
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            "请求体过大".to_string()
        }
        JsonPayloadError::Deserialize(e) => format!("请求体格式错误: {e}"),
        _ => format!("请求体解析失败: {err}"),
    };
    bad_request(message)
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> Error {
    debug!("查询参数解析失败 {}: {}", req.path(), err);
    bad_request(format!("查询参数错误: {err}"))
}
