//! 随机码生成

use rand::Rng;
use rand::distr::Alphanumeric;

// 去掉易混淆字符 0/O、1/I/L
const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// 会议房间号，形如 `ABC-DEF-GHJ`
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..3)
        .map(|_| {
            (0..3)
                .map(|_| {
                    ROOM_CODE_CHARSET[rng.random_range(0..ROOM_CODE_CHARSET.len())] as char
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// 随机字母数字串，用于初始密码与密钥
pub fn generate_secret(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_format() {
        let code = generate_room_code();
        assert_eq!(code.len(), 11);
        let groups: Vec<&str> = code.split('-').collect();
        assert_eq!(groups.len(), 3);
        for group in groups {
            assert!(group.bytes().all(|b| ROOM_CODE_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn test_generate_secret() {
        let secret = generate_secret(32);
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(secret, generate_secret(32));
    }
}
