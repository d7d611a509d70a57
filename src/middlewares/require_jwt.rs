/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <access token>`，加载当前用户并放入请求扩展。
 * 只有审核通过（approved）的账号可以访问受保护的路由。
 *
 * ```rust,ignore
 * web::scope("/api/v1/meetings")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_meetings))
 * ```
 *
 * 处理程序中通过 [`RequireJWT::extract_user`] / [`RequireJWT::extract_user_id`] 取用户。
 * 用户信息按 `user:{id}` 缓存，审核状态变化时由用户服务清除。
 */

use crate::cache::{CacheResult, ObjectCache, user_cache_key};
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct RequireJWT;

/// 认证失败的原因
#[derive(Debug)]
enum AuthFailure {
    Unauthenticated(&'static str),
    NotApproved,
    Internal(&'static str),
}

impl AuthFailure {
    fn into_response(self) -> HttpResponse {
        match self {
            AuthFailure::Unauthenticated(msg) => {
                create_error_response(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg)
            }
            AuthFailure::NotApproved => create_error_response(
                StatusCode::FORBIDDEN,
                ErrorCode::AccountNotApproved,
                "账号尚未通过审核",
            ),
            AuthFailure::Internal(msg) => create_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                msg,
            ),
        }
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// 先查缓存，未命中再查存储并回填
pub async fn load_user(
    user_id: i64,
    storage: &Arc<dyn Storage>,
    cache: &Arc<dyn ObjectCache>,
) -> Result<Option<User>, crate::errors::LmsError> {
    let key = user_cache_key(user_id);
    match cache.get_json::<User>(&key).await {
        CacheResult::Found(user) => return Ok(Some(user)),
        CacheResult::ExistsButNoValue => cache.remove(&key).await,
        CacheResult::NotFound => {}
    }

    let user = storage.get_user_by_id(user_id).await?;
    if let Some(ref user) = user {
        cache
            .insert_json(key, user, AppConfig::get().cache.default_ttl)
            .await;
    }
    Ok(user)
}

/// 校验 access token 并返回审核通过的用户
async fn authenticate(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = bearer_token(req)
        .ok_or(AuthFailure::Unauthenticated("缺少或无效的 Authorization 头"))?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        debug!("JWT token validation failed: {}", err);
        AuthFailure::Unauthenticated("无效或已过期的访问令牌")
    })?;
    let user_id = claims
        .user_id()
        .ok_or(AuthFailure::Unauthenticated("令牌中的用户ID无效"))?;

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .ok_or(AuthFailure::Internal("存储服务不可用"))?
        .get_ref()
        .clone();
    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .ok_or(AuthFailure::Internal("缓存服务不可用"))?
        .get_ref()
        .clone();

    let user = load_user(user_id, &storage, &cache)
        .await
        .map_err(|e| {
            info!("Failed to load user {}: {}", user_id, e);
            AuthFailure::Internal("获取用户信息失败")
        })?
        .ok_or(AuthFailure::Unauthenticated("用户不存在"))?;

    if !user.is_approved() {
        return Err(AuthFailure::NotApproved);
    }
    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
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
        Box::pin(async move {
            // CORS 预检直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(HttpResponse::NoContent().finish().map_into_right_body()));
            }

            match authenticate(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(failure) => {
                    info!("Authentication failed for {}: {:?}", req.path(), failure);
                    Ok(req.into_response(failure.into_response().map_into_right_body()))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 当前用户（需在 RequireJWT 保护的路由中调用）
    pub fn extract_user(req: &HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role.clone())
    }
}
