//! Points ledger
//!
//! `append_entry` and `remove_entry` are the only writers of
//! `visitors.total_points`. Both change the ledger row and the cached balance
//! inside the caller's transaction, with the visitor row already locked, so
//! `total_points == Σ amount` holds at every commit.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::{debug, info, warn};

use super::SeaOrmStorage;
use super::converters::model_to_points_entry;
use super::retry;
use crate::errors::{LoyaltyError, Result};
use crate::storage::models::{LedgerAudit, NewPointsEntry, PointsEntry, TransactionType};
use migration::entities::{points_transaction, visitor};

async fn load_balance<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: &str,
    device_id: &str,
) -> Result<visitor::Model> {
    visitor::Entity::find()
        .filter(visitor::Column::RestaurantId.eq(restaurant_id))
        .filter(visitor::Column::DeviceId.eq(device_id))
        .one(conn)
        .await?
        .ok_or_else(|| {
            LoyaltyError::not_found(format!(
                "visitor {}/{} has no ledger",
                restaurant_id, device_id
            ))
        })
}

async fn store_balance<C: ConnectionTrait>(conn: &C, visitor_id: i64, total: i64) -> Result<()> {
    use sea_orm::ActiveValue::{Set, Unchanged};

    visitor::ActiveModel {
        id: Unchanged(visitor_id),
        total_points: Set(total),
        ..Default::default()
    }
    .update(conn)
    .await?;
    Ok(())
}

/// Append a ledger row and add its amount to the cached balance
///
/// Returns the new balance.
pub async fn append_entry<C: ConnectionTrait>(
    conn: &C,
    entry: NewPointsEntry,
    now: DateTime<Utc>,
) -> Result<i64> {
    use sea_orm::ActiveValue::{NotSet, Set};

    let owner = load_balance(conn, &entry.restaurant_id, &entry.device_id).await?;

    let inserted = points_transaction::ActiveModel {
        id: NotSet,
        restaurant_id: Set(entry.restaurant_id.clone()),
        device_id: Set(entry.device_id.clone()),
        order_id: Set(entry.order_id),
        gift_id: Set(entry.gift_id),
        tx_type: Set(entry.tx_type.as_ref().to_string()),
        amount: Set(entry.amount),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    let total = owner.total_points.saturating_add(entry.amount);
    store_balance(conn, owner.id, total).await?;

    info!(
        "Ledger append: id={} {}/{} {} {:+} -> balance {}",
        inserted.id,
        entry.restaurant_id,
        entry.device_id,
        entry.tx_type.as_ref(),
        entry.amount,
        total
    );
    Ok(total)
}

/// Delete a ledger row and take its amount back out of the cached balance
///
/// The balance never goes below zero. Returns the new balance.
pub async fn remove_entry<C: ConnectionTrait>(conn: &C, entry: &PointsEntry) -> Result<i64> {
    let owner = load_balance(conn, &entry.restaurant_id, &entry.device_id).await?;

    let deleted = points_transaction::Entity::delete_by_id(entry.id)
        .exec(conn)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(LoyaltyError::not_found(format!(
            "ledger entry {} not found",
            entry.id
        )));
    }

    let total = (owner.total_points - entry.amount).max(0);
    if owner.total_points < entry.amount {
        warn!(
            "Ledger remove clamped balance at 0: {}/{} had {} and removed {}",
            entry.restaurant_id, entry.device_id, owner.total_points, entry.amount
        );
    }
    store_balance(conn, owner.id, total).await?;

    info!(
        "Ledger remove: id={} {}/{} {} {:+} -> balance {}",
        entry.id,
        entry.restaurant_id,
        entry.device_id,
        entry.tx_type.as_ref(),
        -entry.amount,
        total
    );
    Ok(total)
}

/// The CONVERT_GIFT row written for `gift_id`, if any
pub async fn find_conversion_entry<C: ConnectionTrait>(
    conn: &C,
    gift_id: i64,
) -> Result<Option<PointsEntry>> {
    let model = points_transaction::Entity::find()
        .filter(points_transaction::Column::GiftId.eq(gift_id))
        .filter(points_transaction::Column::TxType.eq(TransactionType::ConvertGift.as_ref()))
        .one(conn)
        .await?;
    model.map(model_to_points_entry).transpose()
}

impl SeaOrmStorage {
    /// Ledger rows of a visitor, newest first
    pub async fn ledger_history(
        &self,
        restaurant_id: &str,
        device_id: &str,
    ) -> Result<Vec<PointsEntry>> {
        let db = &self.db;
        let models = retry::with_retry(
            &format!("ledger_history({}/{})", restaurant_id, device_id),
            self.retry_config,
            || async {
                points_transaction::Entity::find()
                    .filter(points_transaction::Column::RestaurantId.eq(restaurant_id))
                    .filter(points_transaction::Column::DeviceId.eq(device_id))
                    .order_by_desc(points_transaction::Column::CreatedAt)
                    .order_by_desc(points_transaction::Column::Id)
                    .all(db)
                    .await
            },
        )
        .await?;

        models.into_iter().map(model_to_points_entry).collect()
    }

    /// Recompute Σ amount and compare it with the cached balance
    pub async fn audit_ledger(&self, restaurant_id: &str, device_id: &str) -> Result<LedgerAudit> {
        let db = &self.db;
        let cached = self
            .find_visitor(restaurant_id, device_id)
            .await?
            .map(|v| v.total_points)
            .unwrap_or(0);

        let amounts: Vec<i64> = retry::with_retry(
            &format!("audit_ledger({}/{})", restaurant_id, device_id),
            self.retry_config,
            || async {
                points_transaction::Entity::find()
                    .select_only()
                    .column(points_transaction::Column::Amount)
                    .filter(points_transaction::Column::RestaurantId.eq(restaurant_id))
                    .filter(points_transaction::Column::DeviceId.eq(device_id))
                    .into_tuple::<i64>()
                    .all(db)
                    .await
            },
        )
        .await?;
        let computed: i64 = amounts.iter().sum();

        let audit = LedgerAudit {
            cached,
            computed,
            consistent: cached == computed,
        };
        if audit.consistent {
            debug!(
                "Ledger audit ok: {}/{} balance {}",
                restaurant_id, device_id, cached
            );
        } else {
            warn!(
                "Ledger drift: {}/{} cached {} but rows sum to {}",
                restaurant_id, device_id, cached, computed
            );
        }
        Ok(audit)
    }
}
