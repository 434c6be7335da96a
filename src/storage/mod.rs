use std::sync::Arc;

use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use models::{
    Gift, GiftStatus, GiftType, LedgerAudit, NewGift, NewOrder, NewPointsEntry, OrderRecord,
    PointsEntry, RestaurantSettings, TransactionType, Visitor,
};

pub struct StorageFactory;

impl StorageFactory {
    /// Connect to `database.database_url` and run migrations
    pub async fn create() -> Result<Arc<SeaOrmStorage>> {
        let config = crate::config::get_config();
        let database_url = &config.database.database_url;

        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage = SeaOrmStorage::new(database_url, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}
