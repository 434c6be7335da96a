//! SeaORM storage backend
//!
//! SQLite, MySQL/MariaDB and PostgreSQL. Read-side queries live on
//! [`SeaOrmStorage`] and retry on contention; the transactional helpers in
//! `visitors`, `gifts`, `ledger`, `orders` and `locks` take any
//! `ConnectionTrait` so the service can run them inside one transaction.

mod connection;
mod converters;
pub mod gifts;
pub mod ledger;
pub mod locks;
pub mod orders;
pub mod retry;
pub mod settings;
pub mod visitors;

use std::time::Duration;

use moka::sync::Cache;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::warn;

use crate::config::LoyaltyConfig;
use crate::errors::{LoyaltyError, Result};
use crate::storage::models::{RestaurantSettings, StorageConfig};

pub use connection::{connect_generic, connect_sqlite, generic_connect_options, run_migrations};
pub use converters::{model_to_gift, model_to_visitor};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(LoyaltyError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// restaurant_id → settings
    settings_cache: Cache<String, RestaurantSettings>,
    retry_config: retry::RetryConfig,
    loyalty_defaults: LoyaltyConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(LoyaltyError::database_config("database_url is not set"));
        }

        let config = crate::config::get_config();

        let timeout = Duration::from_secs(config.database.timeout);
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, timeout).await?
        } else {
            connect_generic(database_url, backend_name, config.database.pool_size, timeout).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            settings_cache: Cache::builder()
                .time_to_live(Duration::from_secs(config.loyalty.settings_cache_ttl_secs))
                .max_capacity(10_000)
                .build(),
            retry_config: retry::RetryConfig::from(&config.database),
            loyalty_defaults: config.loyalty.clone(),
        };

        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn get_backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: self.backend_name.clone(),
        }
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn loyalty_defaults(&self) -> &LoyaltyConfig {
        &self.loyalty_defaults
    }

    /// Start a transaction; dropping it without `commit` rolls back
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        self.db.begin().await.map_err(|e| {
            LoyaltyError::database_operation(format!("Failed to begin transaction: {}", e))
        })
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| LoyaltyError::database_connection(format!("ping failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://loyalty.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("loyalty.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("mariadb://u@h/db").unwrap(), "mysql");
        assert_eq!(
            infer_backend_from_url("postgresql://u@h/db").unwrap(),
            "postgres"
        );
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }
}
