use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::get_config;
use crate::services::LoyaltyService;
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub loyalty_service: Arc<LoyaltyService>,
    pub route_config: RouteConfig,
}

#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub api_prefix: String,
    pub health_prefix: String,
}

/// 准备服务器启动的上下文
/// 包括存储、忠诚度服务和路由配置
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!(
        "Using storage backend: {}",
        storage.get_backend_config().storage_type
    );

    let loyalty_service = Arc::new(LoyaltyService::from_config(storage.clone()));
    info!(
        "Session timeout: {}s",
        loyalty_service.policy().timeout.as_secs()
    );

    let config = get_config();
    let route_config = RouteConfig {
        api_prefix: config.server.api_prefix.clone(),
        health_prefix: config.server.health_prefix.clone(),
    };

    check_loyalty_defaults();

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        loyalty_service,
        route_config,
    })
}

/// 启动时检查明显不合理的默认值
fn check_loyalty_defaults() {
    let loyalty = &get_config().loyalty;

    if loyalty.session_timeout_secs == 0 {
        warn!(
            "WARNING: session_timeout_secs is 0. \
            Every observation opens a new visit window."
        );
    }

    if loyalty.default_points_per_euro <= 0 {
        warn!("Gift conversion yields 0 points (default_points_per_euro <= 0)");
    }

    if !(0..=100).contains(&loyalty.default_welcome_gift_percentage) {
        warn!(
            "default_welcome_gift_percentage {} is outside 0..=100",
            loyalty.default_welcome_gift_percentage
        );
    }
}
