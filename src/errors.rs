//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use std::fmt;

use crate::models::{ApiResponse, ErrorCode};

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_lms_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum LmsError {
            $($variant(String),)*
        }

        impl LmsError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(LmsError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(LmsError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(LmsError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl LmsError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        LmsError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_lms_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DateParse("E010", "Date Parse Error"),
    Authentication("E011", "Authentication Error"),
    Authorization("E012", "Authorization Error"),
    InvalidState("E013", "Invalid State Error"),
    Conflict("E014", "Conflict Error"),
}

impl LmsError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 对应的 HTTP 状态码
    ///
    /// 校验与状态错误 400，权限 403，资源不存在 404，并发冲突 409，其余 500。
    pub fn status_code(&self) -> StatusCode {
        match self {
            LmsError::Validation(_) | LmsError::DateParse(_) | LmsError::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            LmsError::Authentication(_) => StatusCode::UNAUTHORIZED,
            LmsError::Authorization(_) => StatusCode::FORBIDDEN,
            LmsError::NotFound(_) => StatusCode::NOT_FOUND,
            LmsError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 对应的业务错误码
    pub fn api_code(&self) -> ErrorCode {
        match self {
            LmsError::Validation(_) | LmsError::DateParse(_) => ErrorCode::BadRequest,
            LmsError::InvalidState(_) => ErrorCode::InvalidState,
            LmsError::Authentication(_) => ErrorCode::Unauthorized,
            LmsError::Authorization(_) => ErrorCode::Forbidden,
            LmsError::NotFound(_) => ErrorCode::NotFound,
            LmsError::Conflict(_) => ErrorCode::Conflict,
            _ => ErrorCode::InternalServerError,
        }
    }

    /// 转换为统一的 JSON 错误响应
    pub fn to_http_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ApiResponse::error_empty(self.api_code(), self.message()))
    }
}

impl fmt::Display for LmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LmsError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LmsError {
    fn from(err: sea_orm::DbErr) -> Self {
        LmsError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for LmsError {
    fn from(err: std::io::Error) -> Self {
        LmsError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LmsError {
    fn from(err: serde_json::Error) -> Self {
        LmsError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for LmsError {
    fn from(err: chrono::ParseError) -> Self {
        LmsError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LmsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LmsError::cache_connection("test").code(), "E001");
        assert_eq!(LmsError::database_config("test").code(), "E003");
        assert_eq!(LmsError::validation("test").code(), "E007");
        assert_eq!(LmsError::authentication("test").code(), "E011");
        assert_eq!(LmsError::invalid_state("test").code(), "E013");
        assert_eq!(LmsError::conflict("test").code(), "E014");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            LmsError::cache_connection("test").error_type(),
            "Cache Connection Error"
        );
        assert_eq!(
            LmsError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_error_message() {
        let err = LmsError::validation("Invalid input");
        assert_eq!(err.message(), "Invalid input");
    }

    #[test]
    fn test_format_simple() {
        let err = LmsError::validation("Invalid URL");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid URL"));
    }

    #[test]
    fn test_db_err_maps_to_database_operation() {
        let err: LmsError = sea_orm::DbErr::RecordNotFound("meeting".into()).into();
        assert_eq!(err.code(), "E005");
        assert!(err.message().contains("meeting"));
    }

    #[test]
    fn test_status_codes_follow_http_conventions() {
        assert_eq!(
            LmsError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LmsError::invalid_state("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LmsError::authorization("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(LmsError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            LmsError::database_operation("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = LmsError::invalid_state("会议尚未开始");
        assert_eq!(err.to_string(), "Invalid State Error: 会议尚未开始");
    }
}
