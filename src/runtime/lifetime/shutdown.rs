use sea_orm::DatabaseConnection;
use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Waits for Ctrl+C, then closes the connection pool
///
/// In-flight transactions that never commit are rolled back by the database
/// once their connection goes away.
pub async fn listen_for_shutdown(db: &DatabaseConnection) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, closing database pool...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    let shutdown_result = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        db.clone().close(),
    )
    .await;

    match shutdown_result {
        Ok(Ok(())) => {
            info!("Database pool closed");
        }
        Ok(Err(e)) => {
            error!("Failed to close database pool: {}", e);
        }
        Err(_) => {
            error!(
                "Database pool close timed out after {} seconds",
                SHUTDOWN_TIMEOUT_SECS
            );
        }
    }
}
