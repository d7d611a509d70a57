use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::cache::user_cache_key;
use crate::models::notifications::entities::{NotificationType, ReferenceType};
use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::UserStatus, requests::UpdateUserStatusRequest, responses::UserResponse},
};
use crate::services::notifications::dispatch::{NotificationDraft, notify_users};
use crate::services::{cache_from_request, current_user};

fn approval_notification(status: &UserStatus) -> Option<NotificationDraft> {
    match status {
        UserStatus::Approved => Some(
            NotificationDraft::new(NotificationType::AccountApproved, "账号已通过审核")
                .content("现在可以登录并参加会议"),
        ),
        UserStatus::Rejected => Some(
            NotificationDraft::new(NotificationType::AccountRejected, "账号审核未通过")
                .content("如有疑问请联系管理员"),
        ),
        UserStatus::Pending => None,
    }
}

pub async fn update_user_status(
    service: &UserService,
    user_id: i64,
    update: UpdateUserStatusRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let admin = try_response!(current_user(request));
    if admin.id == user_id {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "不能修改自己的审核状态",
        )));
    }
    let Some(draft) = approval_notification(&update.status) else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "审核状态只能是 approved 或 rejected",
        )));
    };

    let storage = try_response!(service.get_storage(request));
    let previous = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "User not found",
            )));
        }
        Err(e) => return Ok(e.to_http_response()),
    };

    let user = match storage.update_user_status(user_id, update.status.clone()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "User not found",
            )));
        }
        Err(e) => {
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::UserUpdateFailed,
                format!("Failed to update user status: {}", e.message()),
            )));
        }
    };

    // 已登录会话下次请求时按新状态校验
    if let Ok(cache) = cache_from_request(request) {
        cache.remove(&user_cache_key(user.id)).await;
    }

    if previous.status != user.status {
        info!(
            "User {} status changed {} -> {} by admin {}",
            user.id, previous.status, user.status, admin.id
        );
        notify_users(
            &storage,
            &[user.id],
            draft.reference(ReferenceType::User, user.id),
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "用户状态已更新",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_final_statuses_notify() {
        assert_eq!(
            approval_notification(&UserStatus::Approved).map(|d| d.notification_type),
            Some(NotificationType::AccountApproved)
        );
        assert_eq!(
            approval_notification(&UserStatus::Rejected).map(|d| d.notification_type),
            Some(NotificationType::AccountRejected)
        );
        assert!(approval_notification(&UserStatus::Pending).is_none());
    }
}
