//! 输入校验

use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]*$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

const WEAK_PASSWORDS: [&str; 8] = [
    "password",
    "12345678",
    "qwerty123",
    "admin123",
    "password1",
    "welcome1",
    "letmein1",
    "abcd1234",
];

pub const MEETING_TITLE_MAX_CHARS: usize = 200;
pub const MEETING_DURATION_RANGE: std::ops::RangeInclusive<i32> = 1..=600;

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    // 3 <= 长度 <= 32，字母开头
    if username.len() < 3 || username.len() > 32 {
        return Err("Username length must be between 3 and 32 characters");
    }
    if !USERNAME_RE.is_match(username) {
        return Err(
            "Username must start with a letter and contain only letters, digits, '_', '.' or '-'",
        );
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 密码策略：至少 8 位，包含大小写字母与数字，且不是常见弱密码。
/// 返回所有未满足的条目。
pub fn validate_password(password: &str) -> Result<(), Vec<&'static str>> {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long");
    }
    if password.len() > 128 {
        errors.push("Password must be at most 128 bytes long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }
    if WEAK_PASSWORDS
        .iter()
        .any(|weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_meeting_title(title: &str) -> Result<(), &'static str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Meeting title must not be empty");
    }
    if trimmed.chars().count() > MEETING_TITLE_MAX_CHARS {
        return Err("Meeting title must be at most 200 characters");
    }
    Ok(())
}

pub fn validate_meeting_duration(duration_minutes: i32) -> Result<(), &'static str> {
    if !MEETING_DURATION_RANGE.contains(&duration_minutes) {
        return Err("Meeting duration must be between 1 and 600 minutes");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob_2024.x").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("9lives").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("teacher@school.edu").is_ok());
        assert!(validate_email("no-at-sign.edu").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("SecurePass123").is_ok());

        let errors = validate_password("abc").unwrap_err();
        assert!(errors.contains(&"Password must be at least 8 characters long"));
        assert!(errors.contains(&"Password must contain at least one uppercase letter"));
        assert!(errors.contains(&"Password must contain at least one digit"));

        let errors = validate_password("Password1").unwrap_err();
        assert_eq!(
            errors,
            vec!["Password is too common, please choose a stronger password"]
        );
    }

    #[test]
    fn test_meeting_title_and_duration() {
        assert!(validate_meeting_title("Lecture 1").is_ok());
        assert!(validate_meeting_title("   ").is_err());
        assert!(validate_meeting_title(&"x".repeat(201)).is_err());

        assert!(validate_meeting_duration(1).is_ok());
        assert!(validate_meeting_duration(600).is_ok());
        assert!(validate_meeting_duration(0).is_err());
        assert!(validate_meeting_duration(601).is_err());
    }
}
