use tokio::signal;
use tracing::{error, warn};

/// 等待 Ctrl+C；无法注册信号处理时一直挂起，由服务器自身结束
pub async fn listen_for_shutdown() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");
}
