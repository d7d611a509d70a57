use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::UserService;
use crate::errors::LmsError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{
        entities::UserStatus,
        requests::{CreateUserRequest, NewUser},
        responses::UserResponse,
    },
};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password, validate_username};

/// 新账号的用户名、邮箱、密码校验，注册与管理员创建共用
pub(crate) fn validate_new_account(
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), HttpResponse> {
    if let Err(msg) = validate_username(username) {
        return Err(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg)));
    }
    if let Err(msg) = validate_email(email) {
        return Err(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
    }
    if let Err(problems) = validate_password(password) {
        return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserPasswordInvalid,
            problems.join("；"),
        )));
    }
    Ok(())
}

/// 唯一约束冲突映射为 409，其余为 500
pub(crate) fn account_creation_error(e: LmsError) -> HttpResponse {
    match e {
        LmsError::Conflict(_) => HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserAlreadyExists,
            "Username or email already exists",
        )),
        other => {
            error!("User creation failed: {}", other);
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::UserCreationFailed,
                format!("User creation failed: {}", other.message()),
            ))
        }
    }
}

pub async fn create_user(
    service: &UserService,
    user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let username = user_data.username.trim().to_string();
    let email = user_data.email.trim().to_lowercase();
    if let Err(response) = validate_new_account(&username, &email, &user_data.password) {
        return Ok(response);
    }

    let password_hash = try_response!(hash_password(&user_data.password));
    let storage = try_response!(service.get_storage(request));

    let new_user = NewUser {
        username,
        email,
        password_hash,
        role: user_data.role,
        status: UserStatus::Approved,
        display_name: user_data.display_name,
        avatar_url: user_data.avatar_url,
    };

    match storage.create_user(new_user).await {
        Ok(user) => {
            info!("Admin created user {} ({})", user.username, user.role);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(UserResponse { user }, "用户创建成功")))
        }
        Err(e) => Ok(account_creation_error(e)),
    }
}
