//! Restaurant settings with a TTL cache in front

use chrono::Utc;
use sea_orm::{ConnectionTrait, EntityTrait, sea_query::OnConflict};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::{model_to_settings, settings_to_active_model};
use super::retry;
use crate::config::LoyaltyConfig;
use crate::errors::Result;
use crate::storage::models::RestaurantSettings;
use migration::entities::restaurant_settings;

/// 绕过缓存读取餐厅配置，供事务内使用
pub async fn load_settings<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: &str,
    defaults: &LoyaltyConfig,
) -> Result<RestaurantSettings> {
    let model = restaurant_settings::Entity::find_by_id(restaurant_id.to_string())
        .one(conn)
        .await?;
    Ok(match model {
        Some(model) => model_to_settings(model),
        None => RestaurantSettings::from_defaults(restaurant_id, defaults),
    })
}

impl SeaOrmStorage {
    /// Settings for a restaurant, falling back to the `[loyalty]` defaults
    pub async fn get_settings(&self, restaurant_id: &str) -> Result<RestaurantSettings> {
        if let Some(cached) = self.settings_cache.get(restaurant_id) {
            return Ok(cached);
        }

        let db = &self.db;
        let model = retry::with_retry(
            &format!("get_settings({})", restaurant_id),
            self.retry_config,
            || async {
                restaurant_settings::Entity::find_by_id(restaurant_id.to_string())
                    .one(db)
                    .await
            },
        )
        .await?;

        let settings = match model {
            Some(model) => model_to_settings(model),
            None => {
                debug!(
                    "No stored settings for restaurant {}, using defaults",
                    restaurant_id
                );
                RestaurantSettings::from_defaults(restaurant_id, &self.loyalty_defaults)
            }
        };

        self.settings_cache
            .insert(restaurant_id.to_string(), settings.clone());
        Ok(settings)
    }

    /// Insert or replace a restaurant's settings and drop its cache entry
    pub async fn upsert_settings(
        &self,
        settings: &RestaurantSettings,
    ) -> Result<RestaurantSettings> {
        let now = Utc::now();
        let active = settings_to_active_model(settings, now);

        restaurant_settings::Entity::insert(active)
            .on_conflict(
                OnConflict::column(restaurant_settings::Column::RestaurantId)
                    .update_columns([
                        restaurant_settings::Column::PointsPerEuro,
                        restaurant_settings::Column::GiftConversionEnabled,
                        restaurant_settings::Column::RequireBankedVisit,
                        restaurant_settings::Column::WelcomeOncePerSession,
                        restaurant_settings::Column::WelcomeGiftPercentage,
                        restaurant_settings::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.settings_cache.invalidate(&settings.restaurant_id);
        info!(
            "Restaurant settings updated: {} (points_per_euro={}, conversion={})",
            settings.restaurant_id, settings.points_per_euro, settings.gift_conversion_enabled
        );

        Ok(RestaurantSettings {
            updated_at: Some(now),
            ..settings.clone()
        })
    }
}
