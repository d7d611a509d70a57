use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 内置默认值，保证没有配置文件时也能启动
fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("app.system_name", "Smart LMS")?
        .set_default("app.environment", "development")?
        .set_default("app.log_level", "info")?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.unix_socket_path", "")?
        .set_default("server.workers", 0)?
        .set_default("server.max_workers", 16)?
        .set_default("server.timeouts.client_request", 5000)?
        .set_default("server.timeouts.client_disconnect", 1000)?
        .set_default("server.timeouts.keep_alive", 30)?
        .set_default("server.limits.max_payload_size", 1_048_576)?
        .set_default("jwt.secret", "")?
        .set_default("jwt.access_token_expiry", 15)?
        .set_default("jwt.refresh_token_expiry", 7)?
        .set_default("jwt.refresh_token_remember_me_expiry", 30)?
        .set_default("database.url", "lms.db")?
        .set_default("database.pool_size", 8)?
        .set_default("database.timeout", 10)?
        .set_default("cache.type", "moka")?
        .set_default("cache.default_ttl", 300)?
        .set_default("cache.redis.url", "redis://127.0.0.1:6379")?
        .set_default("cache.redis.key_prefix", "lms:")?
        .set_default("cache.redis.pool_size", 8)?
        .set_default("cache.memory.max_capacity", 10_000)?
        .set_default("cors.allowed_origins", Vec::<String>::new())?
        .set_default("cors.max_age", 3600)?
        .set_default("argon2.memory_cost", 19_456)?
        .set_default("argon2.time_cost", 2)?
        .set_default("argon2.parallelism", 1)?
        .set_default("attendance.late_grace_minutes", 10)?
        .set_default("attendance.present_threshold", 75.0)
}

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = with_defaults(Config::builder())?
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖
            .add_source(
                Environment::with_prefix("LMS")
                    .separator("_")
                    .try_parsing(true),
            );

        // 支持从环境变量加载
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "cache.redis.key_prefix",
                std::env::var("REDIS_KEY_PREFIX").ok(),
            )?;

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config.finalize())
    }

    /// 仅使用内置默认值（测试与诊断用）
    pub fn defaults() -> Result<Self, ConfigError> {
        let config = with_defaults(Config::builder())?.build()?;
        let app_config: AppConfig = config.try_deserialize()?;
        Ok(app_config.finalize())
    }

    fn finalize(mut self) -> Self {
        // 未配置密钥时使用随机密钥，重启后已签发的令牌失效
        if self.jwt.secret.is_empty() {
            self.jwt.secret = crate::utils::random_code::generate_secret(48);
        }

        // 处理工作线程数
        if self.server.workers == 0 {
            self.server.workers = num_cpus::get().min(self.server.max_workers).max(1);
        }
        self
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let config = AppConfig::defaults().expect("defaults should deserialize");
        assert_eq!(config.app.system_name, "Smart LMS");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.workers >= 1);
        assert_eq!(config.cache.cache_type, "moka");
        assert!(config.is_development());
    }

    #[test]
    fn test_default_attendance_policy() {
        let policy = AppConfig::defaults().unwrap().attendance.policy();
        assert_eq!(policy.late_grace_minutes, 10);
        assert_eq!(policy.present_threshold, 75.0);
    }
}
