/// 处理函数中展开 `Result<T, LmsError>`，出错时直接返回对应的错误响应
macro_rules! try_response {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return Ok(crate::errors::LmsError::from(e).to_http_response()),
        }
    };
}

pub mod attendance;
pub mod auth;
pub mod emotions;
pub mod meetings;
pub mod notifications;
pub mod system;
pub mod users;
pub mod websocket;

pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use emotions::EmotionService;
pub use meetings::MeetingService;
pub use notifications::NotificationService;
pub use system::SystemService;
pub use users::UserService;
pub use websocket::WebSocketService;

use actix_web::{HttpRequest, web};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::errors::{LmsError, Result};
use crate::middlewares::RequireJWT;
use crate::models::users::entities::User;
use crate::storage::Storage;

/// 从应用数据中取存储实例
pub(crate) fn storage_from_request(request: &HttpRequest) -> Result<Arc<dyn Storage>> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| LmsError::database_config("Storage not found in app data"))
}

pub(crate) fn cache_from_request(request: &HttpRequest) -> Result<Arc<dyn ObjectCache>> {
    request
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| LmsError::cache_plugin_not_found("Cache not found in app data"))
}

/// RequireJWT 放入的当前用户
pub(crate) fn current_user(request: &HttpRequest) -> Result<User> {
    RequireJWT::extract_user(request)
        .ok_or_else(|| LmsError::authentication("Unauthorized access, please login"))
}
