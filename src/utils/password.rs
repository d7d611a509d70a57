use crate::config::AppConfig;
use crate::errors::LmsError;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

/// 使用 Argon2id 哈希密码，参数来自 `argon2` 配置段
pub fn hash_password(password: &str) -> Result<String, LmsError> {
    let config = AppConfig::get();
    let params = Params::new(
        config.argon2.memory_cost,
        config.argon2.time_cost,
        config.argon2.parallelism,
        None,
    )
    .map_err(|e| LmsError::validation(format!("Argon2 参数错误: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| LmsError::validation(format!("密码哈希失败: {e}")))?;
    Ok(hash.to_string())
}

/// 校验密码，参数从哈希串中读取
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("SecurePass123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("SecurePass123", &hash));
        assert!(!verify_password("WrongPass123", &hash));
        assert!(!verify_password("SecurePass123", "not-a-hash"));
    }
}
