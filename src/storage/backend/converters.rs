use std::str::FromStr;

use crate::errors::{LoyaltyError, Result};
use crate::storage::models::{
    Gift, GiftStatus, GiftType, OrderRecord, PointsEntry, RestaurantSettings, TransactionType,
    Visitor,
};
use migration::entities::{gift, order, points_transaction, restaurant_settings, visitor};

/// 将 visitor Model 转换为 Visitor（计数列负值按 0 处理）
pub fn model_to_visitor(model: visitor::Model) -> Visitor {
    Visitor {
        id: model.id,
        restaurant_id: model.restaurant_id,
        device_id: model.device_id,
        visit_count: model.visit_count.max(0) as u32,
        orders_in_current_session: model.orders_in_current_session.max(0) as u32,
        last_session_at: model.last_session_at,
        last_visit_at: model.last_visit_at,
        last_counted_at: model.last_counted_at,
        total_points: model.total_points,
        created_at: model.created_at,
    }
}

/// 将 gift Model 转换为 Gift，类型或状态列无法识别时报错
pub fn model_to_gift(model: gift::Model) -> Result<Gift> {
    let gift_type = GiftType::from_str(&model.gift_type).map_err(|_| {
        LoyaltyError::database_operation(format!(
            "gift {} has unknown type '{}'",
            model.id, model.gift_type
        ))
    })?;
    let status = GiftStatus::from_str(&model.status).map_err(|_| {
        LoyaltyError::database_operation(format!(
            "gift {} has unknown status '{}'",
            model.id, model.status
        ))
    })?;

    Ok(Gift {
        id: model.id,
        restaurant_id: model.restaurant_id,
        device_id: model.device_id,
        gift_type,
        euro_value_cents: model.euro_value_cents,
        percentage_value: model.percentage_value,
        gift_name: model.gift_name,
        status,
        source: model.source,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn model_to_points_entry(model: points_transaction::Model) -> Result<PointsEntry> {
    let tx_type = TransactionType::from_str(&model.tx_type).map_err(|_| {
        LoyaltyError::database_operation(format!(
            "points transaction {} has unknown type '{}'",
            model.id, model.tx_type
        ))
    })?;

    Ok(PointsEntry {
        id: model.id,
        restaurant_id: model.restaurant_id,
        device_id: model.device_id,
        order_id: model.order_id,
        gift_id: model.gift_id,
        tx_type,
        amount: model.amount,
        created_at: model.created_at,
    })
}

pub fn model_to_order(model: order::Model) -> OrderRecord {
    OrderRecord {
        id: model.id,
        restaurant_id: model.restaurant_id,
        loyalty_id: model.loyalty_id,
        status: model.status,
        total_cents: model.total_cents,
        loyalty_discount_applied: model.loyalty_discount_applied,
        loyalty_discount_amount_cents: model.loyalty_discount_amount_cents,
        gift_id: model.gift_id,
        created_at: model.created_at,
    }
}

pub fn model_to_settings(model: restaurant_settings::Model) -> RestaurantSettings {
    RestaurantSettings {
        restaurant_id: model.restaurant_id,
        points_per_euro: model.points_per_euro,
        gift_conversion_enabled: model.gift_conversion_enabled,
        require_banked_visit: model.require_banked_visit,
        welcome_once_per_session: model.welcome_once_per_session,
        welcome_gift_percentage: model.welcome_gift_percentage,
        updated_at: Some(model.updated_at),
    }
}

/// 将 RestaurantSettings 转换为 ActiveModel（用于 upsert）
pub fn settings_to_active_model(
    settings: &RestaurantSettings,
    updated_at: chrono::DateTime<chrono::Utc>,
) -> restaurant_settings::ActiveModel {
    use sea_orm::ActiveValue::Set;

    restaurant_settings::ActiveModel {
        restaurant_id: Set(settings.restaurant_id.clone()),
        points_per_euro: Set(settings.points_per_euro),
        gift_conversion_enabled: Set(settings.gift_conversion_enabled),
        require_banked_visit: Set(settings.require_banked_visit),
        welcome_once_per_session: Set(settings.welcome_once_per_session),
        welcome_gift_percentage: Set(settings.welcome_gift_percentage),
        updated_at: Set(updated_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn gift_model(gift_type: &str, status: &str) -> gift::Model {
        let now = Utc::now();
        gift::Model {
            id: 9,
            restaurant_id: "r1".to_string(),
            device_id: "dev".to_string(),
            gift_type: gift_type.to_string(),
            euro_value_cents: 500,
            percentage_value: 0,
            gift_name: Some("Dessert".to_string()),
            status: status.to_string(),
            source: "manual".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_model_to_gift_parses_enums() {
        let gift = model_to_gift(gift_model("FIXED_VALUE", "converted")).unwrap();
        assert_eq!(gift.gift_type, GiftType::FixedValue);
        assert_eq!(gift.status, GiftStatus::Converted);
        assert_eq!(gift.euro_value_cents, 500);
    }

    #[test]
    fn test_model_to_gift_rejects_unknown_status() {
        let err = model_to_gift(gift_model("ITEM", "expired")).unwrap_err();
        assert!(err.is_internal());
        assert!(err.message().contains("expired"));
    }

    #[test]
    fn test_model_to_visitor_clamps_negative_counters() {
        let now = Utc::now();
        let visitor = model_to_visitor(visitor::Model {
            id: 1,
            restaurant_id: "r1".to_string(),
            device_id: "dev".to_string(),
            visit_count: -1,
            orders_in_current_session: 2,
            last_session_at: now,
            last_visit_at: None,
            last_counted_at: None,
            total_points: 0,
            created_at: now,
        });
        assert_eq!(visitor.visit_count, 0);
        assert_eq!(visitor.orders_in_current_session, 2);
    }
}
