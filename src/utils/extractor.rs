//! 路径参数提取器
//!
//! 解析失败时直接返回 400 的统一 JSON 响应，避免 actix 默认的纯文本错误。

use std::future::{Ready, ready};

use actix_web::error::InternalError;
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload};

use crate::models::{ApiResponse, ErrorCode};

/// 路径中的正整数 `{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeIDI64(pub i64);

fn parse_positive_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.parse::<i64>().ok()).filter(|id| *id > 0)
}

impl FromRequest for SafeIDI64 {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("id");
        ready(match parse_positive_id(raw) {
            Some(id) => Ok(SafeIDI64(id)),
            None => {
                let message = format!("无效的ID参数: {}", raw.unwrap_or_default());
                let response = HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::BadRequest, &message));
                Err(InternalError::from_response(message, response).into())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_parse_positive_id() {
        assert_eq!(parse_positive_id(Some("42")), Some(42));
        assert_eq!(parse_positive_id(Some("0")), None);
        assert_eq!(parse_positive_id(Some("-3")), None);
        assert_eq!(parse_positive_id(Some("abc")), None);
        assert_eq!(parse_positive_id(None), None);
    }

    #[actix_web::test]
    async fn test_extract_from_path() {
        let (req, mut payload) = TestRequest::default()
            .param("id", "7")
            .to_http_parts();
        let id = SafeIDI64::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(id, SafeIDI64(7));

        let (req, mut payload) = TestRequest::default()
            .param("id", "x")
            .to_http_parts();
        assert!(SafeIDI64::from_request(&req, &mut payload).await.is_err());
    }
}
