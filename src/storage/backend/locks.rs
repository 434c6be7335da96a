//! Row locks for money-moving transactions
//!
//! PostgreSQL and MySQL get `SELECT ... FOR UPDATE`. SQLite has no row
//! locks, so the visitor row is touched with a no-op `UPDATE` first: that
//! takes the database write lock for the rest of the transaction and makes
//! concurrent writers queue on `busy_timeout`.
//!
//! Lock order is visitor, then gift. Every transaction that needs both
//! follows it.

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbBackend, EntityTrait, ExprTrait, QueryFilter,
    QuerySelect, sea_query::Expr,
};

use crate::errors::Result;
use migration::entities::{gift, visitor};

fn has_row_locks<C: ConnectionTrait>(conn: &C) -> bool {
    conn.get_database_backend() != DbBackend::Sqlite
}

/// Lock and load the visitor row, `None` when the visitor does not exist
pub async fn lock_visitor<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: &str,
    device_id: &str,
) -> Result<Option<visitor::Model>> {
    let owner = Condition::all()
        .add(visitor::Column::RestaurantId.eq(restaurant_id))
        .add(visitor::Column::DeviceId.eq(device_id));

    if !has_row_locks(conn) {
        visitor::Entity::update_many()
            .col_expr(
                visitor::Column::VisitCount,
                Expr::col(visitor::Column::VisitCount).add(0),
            )
            .filter(owner.clone())
            .exec(conn)
            .await?;
    }

    let mut query = visitor::Entity::find().filter(owner);
    if has_row_locks(conn) {
        query = query.lock_exclusive();
    }
    Ok(query.one(conn).await?)
}

/// Lock and load a gift scoped to its owner
///
/// On SQLite the caller already holds the write lock through
/// [`lock_visitor`], so a plain read is enough.
pub async fn lock_gift<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: &str,
    device_id: &str,
    gift_id: i64,
) -> Result<Option<gift::Model>> {
    let mut query = gift::Entity::find_by_id(gift_id)
        .filter(gift::Column::RestaurantId.eq(restaurant_id))
        .filter(gift::Column::DeviceId.eq(device_id));
    if has_row_locks(conn) {
        query = query.lock_exclusive();
    }
    Ok(query.one(conn).await?)
}
