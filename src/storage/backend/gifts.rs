//! Gift rows

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    Select,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::model_to_gift;
use super::retry;
use crate::errors::Result;
use crate::storage::models::{Gift, GiftStatus, NewGift};
use migration::entities::gift;

pub async fn insert_gift<C: ConnectionTrait>(
    conn: &C,
    new_gift: NewGift,
    now: DateTime<Utc>,
) -> Result<Gift> {
    use sea_orm::ActiveValue::{NotSet, Set};

    let model = gift::ActiveModel {
        id: NotSet,
        restaurant_id: Set(new_gift.restaurant_id),
        device_id: Set(new_gift.device_id),
        gift_type: Set(new_gift.gift_type.as_ref().to_string()),
        euro_value_cents: Set(new_gift.euro_value_cents),
        percentage_value: Set(new_gift.percentage_value),
        gift_name: Set(new_gift.gift_name),
        status: Set(GiftStatus::Unused.as_ref().to_string()),
        source: Set(new_gift.source),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    let gift = model_to_gift(model)?;
    info!(
        "Gift minted: id={} restaurant={} device={} type={} source={}",
        gift.id,
        gift.restaurant_id,
        gift.device_id,
        gift.gift_type.as_ref(),
        gift.source
    );
    Ok(gift)
}

/// Move a locked gift to `status`
pub async fn set_gift_status<C: ConnectionTrait>(
    conn: &C,
    gift_id: i64,
    status: GiftStatus,
    now: DateTime<Utc>,
) -> Result<()> {
    use sea_orm::ActiveValue::{Set, Unchanged};

    gift::ActiveModel {
        id: Unchanged(gift_id),
        status: Set(status.as_ref().to_string()),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(conn)
    .await?;
    Ok(())
}

fn unused_gifts(restaurant_id: &str, device_id: &str) -> Select<gift::Entity> {
    gift::Entity::find()
        .filter(gift::Column::RestaurantId.eq(restaurant_id))
        .filter(gift::Column::DeviceId.eq(device_id))
        .filter(gift::Column::Status.eq(GiftStatus::Unused.as_ref()))
}

pub async fn has_unused_gift<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: &str,
    device_id: &str,
) -> Result<bool> {
    let found = unused_gifts(restaurant_id, device_id).one(conn).await?;
    Ok(found.is_some())
}

impl SeaOrmStorage {
    /// All gifts of a visitor, newest first
    pub async fn list_gifts(&self, restaurant_id: &str, device_id: &str) -> Result<Vec<Gift>> {
        let db = &self.db;
        let models = retry::with_retry(
            &format!("list_gifts({}/{})", restaurant_id, device_id),
            self.retry_config,
            || async {
                gift::Entity::find()
                    .filter(gift::Column::RestaurantId.eq(restaurant_id))
                    .filter(gift::Column::DeviceId.eq(device_id))
                    .order_by_desc(gift::Column::CreatedAt)
                    .order_by_desc(gift::Column::Id)
                    .all(db)
                    .await
            },
        )
        .await?;

        models.into_iter().map(model_to_gift).collect()
    }

    pub async fn find_gift(&self, restaurant_id: &str, gift_id: i64) -> Result<Option<Gift>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("find_gift({})", gift_id),
            self.retry_config,
            || async {
                gift::Entity::find_by_id(gift_id)
                    .filter(gift::Column::RestaurantId.eq(restaurant_id))
                    .one(db)
                    .await
            },
        )
        .await?;

        model.map(model_to_gift).transpose()
    }

    /// Issue a gift outside any order flow (back-office grants, other reward rules)
    pub async fn grant_gift(&self, new_gift: NewGift) -> Result<Gift> {
        insert_gift(&self.db, new_gift, Utc::now()).await
    }

    pub async fn visitor_has_unused_gift(
        &self,
        restaurant_id: &str,
        device_id: &str,
    ) -> Result<bool> {
        let db = &self.db;
        Ok(retry::with_retry(
            &format!("has_unused_gift({}/{})", restaurant_id, device_id),
            self.retry_config,
            || async {
                unused_gifts(restaurant_id, device_id)
                    .one(db)
                    .await
                    .map(|found| found.is_some())
            },
        )
        .await?)
    }
}
