//! Visitor rows: lazy creation, session writes and reads

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    sea_query::OnConflict,
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::model_to_visitor;
use super::retry;
use crate::errors::{LoyaltyError, Result};
use crate::storage::models::Visitor;
use migration::entities::visitor;

/// Insert the visitor row when it is missing
///
/// Uses `ON CONFLICT DO NOTHING` on `(restaurant_id, device_id)`, so two
/// first observations racing each other create exactly one row. Returns
/// `true` when this call created it.
pub async fn ensure_visitor<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: &str,
    device_id: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    use sea_orm::ActiveValue::{NotSet, Set};

    let model = visitor::ActiveModel {
        id: NotSet,
        restaurant_id: Set(restaurant_id.to_string()),
        device_id: Set(device_id.to_string()),
        visit_count: Set(0),
        orders_in_current_session: Set(0),
        last_session_at: Set(now),
        last_visit_at: Set(None),
        last_counted_at: Set(None),
        total_points: Set(0),
        created_at: Set(now),
    };

    let result = visitor::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([visitor::Column::RestaurantId, visitor::Column::DeviceId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await;

    match result {
        Ok(rows) if rows > 0 => {
            info!(
                "Visitor created: restaurant={} device={}",
                restaurant_id, device_id
            );
            Ok(true)
        }
        Ok(_) | Err(sea_orm::DbErr::RecordNotInserted) => Ok(false),
        Err(e) => Err(LoyaltyError::database_operation(format!(
            "Failed to create visitor {}/{}: {}",
            restaurant_id, device_id, e
        ))),
    }
}

/// Persist the session columns of a locked visitor
///
/// `total_points` is left alone; only the ledger writes it.
pub async fn save_session<C: ConnectionTrait>(conn: &C, visitor: &Visitor) -> Result<()> {
    use sea_orm::ActiveValue::{Set, Unchanged};

    let model = visitor::ActiveModel {
        id: Unchanged(visitor.id),
        visit_count: Set(visitor.visit_count as i32),
        orders_in_current_session: Set(visitor.orders_in_current_session as i32),
        last_session_at: Set(visitor.last_session_at),
        last_visit_at: Set(visitor.last_visit_at),
        last_counted_at: Set(visitor.last_counted_at),
        ..Default::default()
    };
    model.update(conn).await?;

    debug!(
        "Session saved: visitor={} visits={} orders={}",
        visitor.id, visitor.visit_count, visitor.orders_in_current_session
    );
    Ok(())
}

impl SeaOrmStorage {
    /// Read a visitor without locking (status screens, listings)
    pub async fn find_visitor(
        &self,
        restaurant_id: &str,
        device_id: &str,
    ) -> Result<Option<Visitor>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("find_visitor({}/{})", restaurant_id, device_id),
            self.retry_config,
            || async {
                visitor::Entity::find()
                    .filter(visitor::Column::RestaurantId.eq(restaurant_id))
                    .filter(visitor::Column::DeviceId.eq(device_id))
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_visitor))
    }
}
