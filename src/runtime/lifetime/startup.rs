use crate::cache::{ObjectCache, register};
use crate::config::AppConfig;
use crate::errors::{LmsError, Result};
use crate::models::users::entities::{UserRole, UserStatus};
use crate::models::users::requests::NewUser;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_secret;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

const FALLBACK_CACHE: &str = "moka";

async fn build_cache(name: &str) -> Result<Arc<dyn ObjectCache>> {
    let constructor = register::get_object_cache_plugin(name).ok_or_else(|| {
        LmsError::cache_plugin_not_found(format!("Cache backend '{name}' not found in registry"))
    })?;
    constructor().await.map(Arc::from)
}

/// 按配置创建缓存，失败时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = AppConfig::get().cache.cache_type.as_str();
    match build_cache(cache_type).await {
        Ok(cache) => {
            info!("Using {} cache backend", cache_type);
            Ok(cache)
        }
        Err(e) if cache_type != FALLBACK_CACHE => {
            warn!("{}; falling back to in-memory cache", e);
            build_cache(FALLBACK_CACHE).await
        }
        Err(e) => Err(e),
    }
}

/// 数据库中没有任何用户时创建 admin 账号
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(count) if count > 0 => {
            debug!("Database already has {} user(s), skipping admin seed", count);
            return;
        }
        Ok(_) => info!("No users found in database, creating default admin account..."),
        Err(e) => {
            warn!("Failed to count users: {}, skipping admin seed", e);
            return;
        }
    }

    let password = std::env::var("ADMIN_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| {
            let generated = generate_secret(16);
            warn!("==========================================================");
            warn!("  ADMIN_PASSWORD NOT SET - USING GENERATED PASSWORD");
            warn!("  Generated admin password: {}", generated);
            warn!("==========================================================");
            generated
        });

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin = NewUser {
        username: "admin".to_string(),
        email: "admin@localhost".to_string(),
        password_hash,
        role: UserRole::Admin,
        status: UserStatus::Approved,
        display_name: Some("Administrator".to_string()),
        avatar_url: None,
    };

    match storage.create_user(admin).await {
        Ok(user) => info!(
            "Default admin account created (ID: {}, username: {})",
            user.id, user.username
        ),
        Err(e) => warn!("Failed to create admin account: {}", e),
    }
}

/// 启动前准备：TLS 提供者、存储（含迁移）、默认管理员、缓存
pub async fn prepare_server_startup() -> Result<StartupContext> {
    // 已安装过时返回 Err，可以忽略
    let _ = rustls::crypto::ring::default_provider().install_default();

    debug!(
        "Registered cache backends: {:?}",
        register::registered_object_cache_plugins()
    );

    let storage = crate::storage::create_storage().await?;
    info!("Storage backend initialized and migrations completed");

    seed_admin(&storage).await;

    let cache = create_cache().await?;

    Ok(StartupContext { storage, cache })
}
