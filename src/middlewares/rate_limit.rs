/*!
 * 速率限制中间件
 *
 * 固定窗口计数：同一限制键在 `window_secs` 内最多放行 `max_requests` 次，
 * 超出返回 429 和 `Retry-After`。已认证请求按用户限流，其余按客户端 IP。
 *
 * ```rust,ignore
 * web::scope("/api/v1/auth")
 *     .service(web::resource("/login").wrap(RateLimit::login()).route(web::post().to(login)))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::warn;

use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};

/// 键: `前缀:标识:窗口序号`，值: 该窗口内的计数
static RATE_LIMIT_COUNTERS: Lazy<Cache<String, Arc<AtomicU32>>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(MAX_WINDOW_SECS))
        .max_capacity(100_000)
        .build()
});

/// 计数条目的最长存活时间，窗口不应超过它
const MAX_WINDOW_SECS: u64 = 3600;

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

/// 一次计数的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: u64 },
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.clamp(1, MAX_WINDOW_SECS),
            key_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    /// 登录：5次/分钟/IP
    pub fn login() -> Self {
        Self::new(5, 60).with_prefix("login")
    }

    /// 注册：3次/分钟/IP
    pub fn register() -> Self {
        Self::new(3, 60).with_prefix("register")
    }

    /// 刷新令牌：10次/分钟/IP
    pub fn refresh_token() -> Self {
        Self::new(10, 60).with_prefix("refresh")
    }

    /// 表情采样上报：120次/分钟/用户
    pub fn emotion_samples() -> Self {
        Self::new(120, 60).with_prefix("emotions")
    }

    /// 对 `identifier` 计数一次
    pub async fn hit(&self, identifier: &str, now_secs: u64) -> RateDecision {
        let window = now_secs / self.window_secs;
        let key = format!("{}:{}:{}", self.key_prefix, identifier, window);
        let counter = RATE_LIMIT_COUNTERS
            .get_with(key, async { Arc::new(AtomicU32::new(0)) })
            .await;

        let count = counter.fetch_add(1, Ordering::AcqRel) + 1;
        if count > self.max_requests {
            let window_end = (window + 1) * self.window_secs;
            RateDecision::Limited {
                retry_after: window_end.saturating_sub(now_secs).max(1),
            }
        } else {
            RateDecision::Allowed {
                remaining: self.max_requests - count,
            }
        }
    }
}

/// 客户端 IP：连接信息优先，其次是反向代理转发头
///
/// 直接暴露在不可信网络时，转发头可以伪造。
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string);

    let forwarded = ["X-Forwarded-For", "X-Real-IP"].iter().find_map(|name| {
        req.headers()
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| ip.parse::<IpAddr>().is_ok())
            .map(str::to_string)
    });

    connection_ip
        .clone()
        .filter(|ip| ip.parse::<IpAddr>().is_ok())
        .or(forwarded)
        .or(connection_ip)
        .unwrap_or_else(|| "unknown".to_string())
}

fn extract_user_id(req: &ServiceRequest) -> Option<i64> {
    req.extensions().get::<User>().map(|user| user.id)
}

/// 创建速率限制错误响应
fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "请求过于频繁，请稍后再试",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let identifier = extract_user_id(&req)
                .map(|id| format!("user:{}", id))
                .unwrap_or_else(|| format!("ip:{}", extract_client_ip(&req)));
            let now_secs = chrono::Utc::now().timestamp().max(0) as u64;

            match limit.hit(&identifier, now_secs).await {
                RateDecision::Allowed { remaining } => {
                    let mut res = srv.call(req).await?.map_into_left_body();
                    let headers = res.headers_mut();
                    if let Ok(value) = HeaderValue::from_str(&limit.max_requests.to_string()) {
                        headers.insert(HeaderName::from_static("x-ratelimit-limit"), value);
                    }
                    if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                        headers.insert(HeaderName::from_static("x-ratelimit-remaining"), value);
                    }
                    Ok(res)
                }
                RateDecision::Limited { retry_after } => {
                    warn!(
                        "Rate limit exceeded for {}:{} ({} per {}s)",
                        limit.key_prefix, identifier, limit.max_requests, limit.window_secs
                    );
                    Ok(req.into_response(
                        create_rate_limit_response(retry_after).map_into_right_body(),
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window_secs, 60);
        assert_eq!(login.key_prefix, "login");

        let register = RateLimit::register();
        assert_eq!(register.max_requests, 3);
        assert_eq!(register.window_secs, 60);

        assert_eq!(RateLimit::emotion_samples().max_requests, 120);
    }

    #[tokio::test]
    async fn test_limit_within_window() {
        let limit = RateLimit::new(2, 60).with_prefix("test_within");
        let now = 6_000;

        assert_eq!(
            limit.hit("ip:10.0.0.1", now).await,
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limit.hit("ip:10.0.0.1", now + 1).await,
            RateDecision::Allowed { remaining: 0 }
        );
        assert_eq!(
            limit.hit("ip:10.0.0.1", now + 30).await,
            RateDecision::Limited { retry_after: 30 }
        );
        // 其他客户端不受影响
        assert_eq!(
            limit.hit("ip:10.0.0.2", now + 30).await,
            RateDecision::Allowed { remaining: 1 }
        );
    }

    #[tokio::test]
    async fn test_limit_resets_next_window() {
        let limit = RateLimit::new(1, 60).with_prefix("test_reset");
        let now = 12_000;

        assert!(matches!(
            limit.hit("user:7", now).await,
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limit.hit("user:7", now + 59).await,
            RateDecision::Limited { .. }
        ));
        assert_eq!(
            limit.hit("user:7", now + 60).await,
            RateDecision::Allowed { remaining: 0 }
        );
    }
}
