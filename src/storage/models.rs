use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use ts_rs::TS;

use crate::config::LoyaltyConfig;

pub const TS_EXPORT_PATH: &str = "../menu-panel/src/services/loyalty.generated.ts";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GiftType {
    FixedValue,
    Percentage,
    Item,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GiftStatus {
    Unused,
    Consumed,
    Converted,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString, TS,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Earn,
    Redeem,
    ConvertGift,
}

/// 访客（按 restaurant_id + device_id 唯一）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: i64,
    pub restaurant_id: String,
    pub device_id: String,
    /// Banked (closed) visits
    pub visit_count: u32,
    pub orders_in_current_session: u32,
    /// Last poll or order
    pub last_session_at: DateTime<Utc>,
    /// When `visit_count` last advanced
    pub last_visit_at: Option<DateTime<Utc>>,
    /// Completed orders at or after this instant count towards the next bank
    pub last_counted_at: Option<DateTime<Utc>>,
    /// Cached Σ amount over the visitor's points transactions
    pub total_points: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
    pub id: i64,
    pub restaurant_id: String,
    pub device_id: String,
    pub gift_type: GiftType,
    pub euro_value_cents: i64,
    pub percentage_value: i32,
    pub gift_name: Option<String>,
    pub status: GiftStatus,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Gift {
    pub fn euro_value(&self) -> f64 {
        self.euro_value_cents as f64 / 100.0
    }
}

/// Gift waiting to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGift {
    pub restaurant_id: String,
    pub device_id: String,
    pub gift_type: GiftType,
    pub euro_value_cents: i64,
    pub percentage_value: i32,
    pub gift_name: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsEntry {
    pub id: i64,
    pub restaurant_id: String,
    pub device_id: String,
    pub order_id: Option<i64>,
    pub gift_id: Option<i64>,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Ledger row waiting to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPointsEntry {
    pub restaurant_id: String,
    pub device_id: String,
    pub order_id: Option<i64>,
    pub gift_id: Option<i64>,
    pub tx_type: TransactionType,
    pub amount: i64,
}

/// Cached balance against the sum of the visitor's ledger rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAudit {
    pub cached: i64,
    pub computed: i64,
    pub consistent: bool,
}

/// Order columns this subsystem reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub restaurant_id: String,
    pub loyalty_id: Option<String>,
    pub status: String,
    pub total_cents: i64,
    pub loyalty_discount_applied: bool,
    pub loyalty_discount_amount_cents: i64,
    pub gift_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub restaurant_id: String,
    pub loyalty_id: Option<String>,
    pub total_cents: i64,
    pub loyalty_discount_applied: bool,
    pub loyalty_discount_amount_cents: i64,
    pub gift_id: Option<i64>,
}

/// 餐厅级忠诚度配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantSettings {
    pub restaurant_id: String,
    pub points_per_euro: i32,
    pub gift_conversion_enabled: bool,
    pub require_banked_visit: bool,
    pub welcome_once_per_session: bool,
    pub welcome_gift_percentage: i32,
    /// None when the restaurant has no stored row and runs on defaults
    pub updated_at: Option<DateTime<Utc>>,
}

impl RestaurantSettings {
    pub fn from_defaults(restaurant_id: &str, defaults: &LoyaltyConfig) -> Self {
        Self {
            restaurant_id: restaurant_id.to_string(),
            points_per_euro: defaults.default_points_per_euro,
            gift_conversion_enabled: defaults.default_gift_conversion_enabled,
            require_banked_visit: defaults.default_require_banked_visit,
            welcome_once_per_session: defaults.default_welcome_once_per_session,
            welcome_gift_percentage: defaults.default_welcome_gift_percentage,
            updated_at: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(GiftType::FixedValue.as_ref(), "FIXED_VALUE");
        assert_eq!(GiftStatus::Converted.as_ref(), "converted");
        assert_eq!(TransactionType::ConvertGift.as_ref(), "CONVERT_GIFT");
        assert_eq!(GiftType::from_str("ITEM").unwrap(), GiftType::Item);
        assert!(GiftStatus::from_str("spent").is_err());
    }

    #[test]
    fn test_euro_value_from_cents() {
        let now = Utc::now();
        let gift = Gift {
            id: 1,
            restaurant_id: "r1".into(),
            device_id: "v1".into(),
            gift_type: GiftType::FixedValue,
            euro_value_cents: 550,
            percentage_value: 0,
            gift_name: None,
            status: GiftStatus::Unused,
            source: "manual".into(),
            created_at: now,
            updated_at: now,
        };
        assert!((gift.euro_value() - 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn export_typescript_types() {
        let cfg = ts_rs::Config::default();
        GiftType::export_all(&cfg).expect("Failed to export GiftType");
        GiftStatus::export_all(&cfg).expect("Failed to export GiftStatus");
        TransactionType::export_all(&cfg).expect("Failed to export TransactionType");
    }
}
