/// 业务错误码
///
/// 0 表示成功；1xxx 通用错误；2xxx 认证；3xxx 用户；4xxx 会议、考勤、通知；5xxx 服务端。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    InvalidState = 1010,
    RateLimitExceeded = 1029,

    // 认证
    AuthFailed = 2000,
    RegisterFailed = 2001,
    AccountNotApproved = 2002,

    // 用户
    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserNameInvalid = 3002,
    UserEmailInvalid = 3003,
    UserPasswordInvalid = 3004,
    UserNameAlreadyExists = 3005,
    UserEmailAlreadyExists = 3006,
    UserCreationFailed = 3007,
    UserUpdateFailed = 3008,

    // 会议
    MeetingNotFound = 4000,
    MeetingPermissionDenied = 4001,
    MeetingNotLive = 4002,
    MeetingInvalidTransition = 4003,
    MeetingNotParticipant = 4004,
    MeetingInvalidParticipants = 4005,

    // 考勤
    AttendanceNotFound = 4100,
    AttendanceNoActiveSession = 4101,

    // 情绪采样
    EmotionSampleInvalid = 4150,

    // 通知
    NotificationNotFound = 4200,

    InternalServerError = 5000,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success as i32, 0);
        assert_eq!(ErrorCode::NotFound as i32, 1004);
        assert_eq!(ErrorCode::AttendanceNoActiveSession as i32, 4101);
        assert_eq!(ErrorCode::InternalServerError as i32, 5000);
    }
}
