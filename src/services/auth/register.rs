use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::models::{
    ApiResponse, ErrorCode,
    auth::RegisterResponse,
    users::{
        entities::{UserRole, UserStatus},
        requests::{NewUser, RegisterRequest},
    },
};
use crate::services::users::create::{account_creation_error, validate_new_account};
use crate::storage::Storage;
use crate::utils::password::hash_password;

use super::AuthService;

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 管理员账号不能自助注册
    if register_request.role == UserRole::Admin {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::RegisterFailed,
            "只能注册为教师或学生",
        )));
    }

    let username = register_request.username.trim().to_string();
    let email = register_request.email.trim().to_lowercase();
    if let Err(response) = validate_new_account(&username, &email, &register_request.password) {
        return Ok(response);
    }

    let storage = try_response!(service.get_storage(request));
    if let Err(response) = check_identity_available(&storage, &username, &email).await {
        return Ok(response);
    }

    let password_hash = try_response!(hash_password(&register_request.password));
    let new_user = NewUser {
        username,
        email,
        password_hash,
        role: register_request.role,
        status: UserStatus::Pending,
        display_name: register_request.display_name,
        avatar_url: None,
    };

    match storage.create_user(new_user).await {
        Ok(user) => {
            info!("User {} registered as {}, awaiting approval", user.username, user.role);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                RegisterResponse {
                    user,
                    requires_approval: true,
                },
                "注册成功，请等待管理员审核",
            )))
        }
        // 并发注册同名账号时由唯一索引兜底
        Err(e) => Ok(account_creation_error(e)),
    }
}

/// 用户名、邮箱是否已被占用，分别给出具体错误码
async fn check_identity_available(
    storage: &std::sync::Arc<dyn Storage>,
    username: &str,
    email: &str,
) -> Result<(), HttpResponse> {
    let register_failed = |e: crate::errors::LmsError| {
        HttpResponse::InternalServerError().json(ApiResponse::error_empty(
            ErrorCode::RegisterFailed,
            format!("Register failed: {}", e.message()),
        ))
    };

    if storage
        .get_user_by_username(username)
        .await
        .map_err(register_failed)?
        .is_some()
    {
        return Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserNameAlreadyExists,
            "Username already exists",
        )));
    }

    if storage
        .get_user_by_email(email)
        .await
        .map_err(register_failed)?
        .is_some()
    {
        return Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserEmailAlreadyExists,
            "Email already exists",
        )));
    }

    Ok(())
}
