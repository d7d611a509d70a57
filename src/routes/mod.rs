pub mod attendance;

pub mod auth;

pub mod emotions;

pub mod meetings;

pub mod notifications;

pub mod system;

pub mod users;

pub mod websocket;

pub use attendance::configure_attendance_routes;
pub use auth::configure_auth_routes;
pub use meetings::configure_meeting_routes;
pub use notifications::configure_notification_routes;
pub use system::configure_system_routes;
pub use users::configure_user_routes;
pub use websocket::configure_websocket_routes;

use actix_web::web;

/// 注册全部 API 路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    configure_auth_routes(cfg);
    configure_user_routes(cfg);
    configure_meeting_routes(cfg);
    configure_attendance_routes(cfg);
    configure_notification_routes(cfg);
    configure_system_routes(cfg);
    configure_websocket_routes(cfg);
}
