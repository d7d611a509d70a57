//! JWT 签发与校验
//!
//! access token 放在 `Authorization: Bearer` 头中，refresh token 只通过
//! http-only cookie 传递。

use crate::config::AppConfig;
use actix_web::cookie::{Cookie, SameSite};
use chrono::TimeDelta;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,           // 用户 ID
    pub role: String,          // 用户角色
    pub token_type: TokenKind, // access / refresh
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct JwtUtils;

impl JwtUtils {
    fn secret() -> &'static [u8] {
        AppConfig::get().jwt.secret.as_bytes()
    }

    /// access token 有效期
    pub fn access_token_ttl() -> TimeDelta {
        TimeDelta::minutes(AppConfig::get().jwt.access_token_expiry)
    }

    pub fn issue(
        user_id: i64,
        role: &str,
        kind: TokenKind,
        ttl: TimeDelta,
    ) -> Result<String, JwtError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            token_type: kind,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(Self::secret()),
        )
    }

    pub fn generate_access_token(user_id: i64, role: &str) -> Result<String, JwtError> {
        Self::issue(user_id, role, TokenKind::Access, Self::access_token_ttl())
    }

    /// 生成 access + refresh，refresh 有效期未指定时使用配置值
    pub fn generate_token_pair(
        user_id: i64,
        role: &str,
        refresh_ttl: Option<TimeDelta>,
    ) -> Result<TokenPair, JwtError> {
        let refresh_ttl = refresh_ttl
            .unwrap_or_else(|| TimeDelta::days(AppConfig::get().jwt.refresh_token_expiry));
        Ok(TokenPair {
            access_token: Self::generate_access_token(user_id, role)?,
            refresh_token: Self::issue(user_id, role, TokenKind::Refresh, refresh_ttl)?,
        })
    }

    pub fn verify(token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(Self::secret()),
            &Validation::default(),
        )?
        .claims;
        if claims.token_type != expected {
            return Err(JwtError::from(ErrorKind::InvalidToken));
        }
        Ok(claims)
    }

    pub fn verify_access_token(token: &str) -> Result<Claims, JwtError> {
        Self::verify(token, TokenKind::Access)
    }

    pub fn verify_refresh_token(token: &str) -> Result<Claims, JwtError> {
        Self::verify(token, TokenKind::Refresh)
    }

    /// refresh token 对应的 cookie，`max_age_days` 与 token 有效期保持一致
    pub fn create_refresh_token_cookie(refresh_token: &str, max_age_days: i64) -> Cookie<'static> {
        Cookie::build(REFRESH_TOKEN_COOKIE, refresh_token.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::days(max_age_days))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(AppConfig::get().is_production())
            .finish()
    }

    /// 清除客户端的 refresh token
    pub fn create_empty_refresh_token_cookie() -> Cookie<'static> {
        let mut cookie = Self::create_refresh_token_cookie("", 0);
        cookie.make_removal();
        cookie
    }

    pub fn extract_refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let pair = JwtUtils::generate_token_pair(42, "teacher", None).unwrap();

        let claims = JwtUtils::verify_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.role, "teacher");

        assert!(JwtUtils::verify_refresh_token(&pair.access_token).is_err());
        assert!(JwtUtils::verify_access_token(&pair.refresh_token).is_err());
        assert!(JwtUtils::verify_refresh_token(&pair.refresh_token).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token =
            JwtUtils::issue(1, "student", TokenKind::Access, TimeDelta::minutes(-10)).unwrap();
        assert!(JwtUtils::verify_access_token(&token).is_err());
    }
}
