//! Orders as seen by the loyalty flow
//!
//! The order pipeline owns these rows. This side inserts new orders at
//! submission time and asks whether a visitor has a completed order since a
//! cutoff; status changes arrive through [`SeaOrmStorage::set_order_status`].

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::model_to_order;
use crate::errors::{LoyaltyError, Result};
use crate::storage::models::{NewOrder, OrderRecord};
use migration::entities::order;

pub const ORDER_STATUS_PENDING: &str = "pending";
pub const ORDER_STATUS_COMPLETED: &str = "completed";

/// Whether the visitor has a completed order created at or after `since`
///
/// `since == None` means the visitor has never banked a visit, so any
/// completed order counts.
pub async fn has_completed_order_since<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: &str,
    device_id: &str,
    since: Option<DateTime<Utc>>,
) -> Result<bool> {
    let mut query = order::Entity::find()
        .filter(order::Column::RestaurantId.eq(restaurant_id))
        .filter(order::Column::LoyaltyId.eq(device_id))
        .filter(order::Column::Status.eq(ORDER_STATUS_COMPLETED));
    if let Some(cutoff) = since {
        query = query.filter(order::Column::CreatedAt.gte(cutoff));
    }
    Ok(query.one(conn).await?.is_some())
}

pub async fn insert_order<C: ConnectionTrait>(
    conn: &C,
    new_order: NewOrder,
    now: DateTime<Utc>,
) -> Result<OrderRecord> {
    use sea_orm::ActiveValue::{NotSet, Set};

    let model = order::ActiveModel {
        id: NotSet,
        restaurant_id: Set(new_order.restaurant_id),
        loyalty_id: Set(new_order.loyalty_id),
        status: Set(ORDER_STATUS_PENDING.to_string()),
        total_cents: Set(new_order.total_cents),
        loyalty_discount_applied: Set(new_order.loyalty_discount_applied),
        loyalty_discount_amount_cents: Set(new_order.loyalty_discount_amount_cents),
        gift_id: Set(new_order.gift_id),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    Ok(model_to_order(model))
}

impl SeaOrmStorage {
    /// Status hook for the order pipeline (kitchen, POS, payment webhooks)
    pub async fn set_order_status(
        &self,
        restaurant_id: &str,
        order_id: i64,
        status: &str,
    ) -> Result<OrderRecord> {
        use sea_orm::ActiveValue::Set;

        let existing = order::Entity::find_by_id(order_id)
            .filter(order::Column::RestaurantId.eq(restaurant_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| LoyaltyError::not_found(format!("order {} not found", order_id)))?;

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(status.to_string());
        let updated = active.update(&self.db).await?;

        info!("Order {} moved to '{}'", order_id, status);
        Ok(model_to_order(updated))
    }
}
