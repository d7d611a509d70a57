use crate::models::users::entities::User;
use serde::Serialize;
use ts_rs::TS;

// 用户响应模型
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/auth.ts")]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub user: User,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/auth.ts")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/auth.ts")]
pub struct UserInfoResponse {
    pub user: User,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/auth.ts")]
pub struct TokenVerificationResponse {
    pub is_valid: bool,
}

/// 注册响应：账号需管理员审核后才能登录
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/app/types/generated/auth.ts")]
pub struct RegisterResponse {
    pub user: User,
    pub requires_approval: bool,
}
