//! Loyalty API 类型定义
//!
//! 所有 JSON 字段使用 camelCase，与点餐前端保持一致。

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::loyalty::SessionState;
use crate::services::{
    GiftConversion, LedgerView, LoyaltyStatus, OrderSubmission, SubmitOrderRequest,
    UpdateSettingsRequest,
};
use crate::storage::models::TS_EXPORT_PATH;
use crate::storage::{Gift, GiftStatus, GiftType, PointsEntry, RestaurantSettings, TransactionType};

/// 统一响应包装
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub total_visits: u32,
    pub orders_in_current_visit: u32,
    pub total_points: i64,
    pub discount_eligible: bool,
    pub has_unused_gift: bool,
    pub gift_conversion_enabled: bool,
    pub session_state: SessionState,
}

impl From<LoyaltyStatus> for StatusResponse {
    fn from(status: LoyaltyStatus) -> Self {
        Self {
            total_visits: status.total_visits,
            orders_in_current_visit: status.orders_in_current_visit,
            total_points: status.total_points,
            discount_eligible: status.discount_eligible,
            has_unused_gift: status.has_unused_gift,
            gift_conversion_enabled: status.gift_conversion_enabled,
            session_state: status.session_state,
        }
    }
}

/// 提交订单请求体
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct PostOrder {
    pub device_id: Option<String>,
    pub total_cents: i64,
    #[serde(default)]
    pub loyalty_discount_applied: bool,
    #[serde(default)]
    pub loyalty_discount_amount_cents: i64,
    pub gift_id: Option<i64>,
}

impl From<PostOrder> for SubmitOrderRequest {
    fn from(body: PostOrder) -> Self {
        Self {
            device_id: body.device_id,
            total_cents: body.total_cents,
            loyalty_discount_applied: body.loyalty_discount_applied,
            loyalty_discount_amount_cents: body.loyalty_discount_amount_cents,
            gift_id: body.gift_id,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i64,
    pub status: String,
    pub total_cents: i64,
    pub loyalty_discount_applied: bool,
    pub gift_id: Option<i64>,
    pub created_at: String,
    pub session_state: Option<SessionState>,
    pub visit_banked: bool,
    pub total_visits: u32,
    pub orders_in_current_visit: u32,
    pub minted_gifts: Vec<GiftResponse>,
}

impl From<OrderSubmission> for OrderResponse {
    fn from(submission: OrderSubmission) -> Self {
        let order = submission.order;
        Self {
            order_id: order.id,
            status: order.status,
            total_cents: order.total_cents,
            loyalty_discount_applied: order.loyalty_discount_applied,
            gift_id: order.gift_id,
            created_at: order.created_at.to_rfc3339(),
            session_state: submission.session_state,
            visit_banked: submission.visit_banked,
            total_visits: submission.total_visits,
            orders_in_current_visit: submission.orders_in_current_visit,
            minted_gifts: submission
                .minted_gifts
                .into_iter()
                .map(GiftResponse::from)
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct GiftResponse {
    pub id: i64,
    pub gift_type: GiftType,
    /// Euros, derived from `euroValueCents`
    pub euro_value: f64,
    pub euro_value_cents: i64,
    pub percentage_value: i32,
    pub gift_name: Option<String>,
    pub status: GiftStatus,
    pub source: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Gift> for GiftResponse {
    fn from(gift: Gift) -> Self {
        Self {
            id: gift.id,
            gift_type: gift.gift_type,
            euro_value: gift.euro_value(),
            euro_value_cents: gift.euro_value_cents,
            percentage_value: gift.percentage_value,
            gift_name: gift.gift_name,
            status: gift.status,
            source: gift.source,
            created_at: gift.created_at.to_rfc3339(),
            updated_at: gift.updated_at.to_rfc3339(),
        }
    }
}

/// convert / revert 请求体
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct GiftActionRequest {
    pub device_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct GiftConversionResponse {
    pub gift_id: i64,
    pub points: i64,
    pub total_points: i64,
    pub status: GiftStatus,
}

impl From<GiftConversion> for GiftConversionResponse {
    fn from(conversion: GiftConversion) -> Self {
        Self {
            gift_id: conversion.gift_id,
            points: conversion.points,
            total_points: conversion.total_points,
            status: conversion.status,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResponse {
    pub id: i64,
    pub order_id: Option<i64>,
    pub gift_id: Option<i64>,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub created_at: String,
}

impl From<PointsEntry> for LedgerEntryResponse {
    fn from(entry: PointsEntry) -> Self {
        Self {
            id: entry.id,
            order_id: entry.order_id,
            gift_id: entry.gift_id,
            tx_type: entry.tx_type,
            amount: entry.amount,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// 积分流水及缓存余额核对结果
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    pub entries: Vec<LedgerEntryResponse>,
    pub total_points: i64,
    pub computed_points: i64,
    pub consistent: bool,
}

impl From<LedgerView> for LedgerResponse {
    fn from(view: LedgerView) -> Self {
        Self {
            entries: view
                .entries
                .into_iter()
                .map(LedgerEntryResponse::from)
                .collect(),
            total_points: view.audit.cached,
            computed_points: view.audit.computed,
            consistent: view.audit.consistent,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub points_per_euro: i32,
    pub gift_conversion_enabled: bool,
    pub require_banked_visit: bool,
    pub welcome_once_per_session: bool,
    pub welcome_gift_percentage: i32,
    /// None while the restaurant runs on defaults
    pub updated_at: Option<String>,
}

impl From<RestaurantSettings> for SettingsResponse {
    fn from(settings: RestaurantSettings) -> Self {
        Self {
            points_per_euro: settings.points_per_euro,
            gift_conversion_enabled: settings.gift_conversion_enabled,
            require_banked_visit: settings.require_banked_visit,
            welcome_once_per_session: settings.welcome_once_per_session,
            welcome_gift_percentage: settings.welcome_gift_percentage,
            updated_at: settings.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    pub points_per_euro: Option<i32>,
    pub gift_conversion_enabled: Option<bool>,
    pub require_banked_visit: Option<bool>,
    pub welcome_once_per_session: Option<bool>,
    pub welcome_gift_percentage: Option<i32>,
}

impl From<UpdateSettings> for UpdateSettingsRequest {
    fn from(body: UpdateSettings) -> Self {
        Self {
            points_per_euro: body.points_per_euro,
            gift_conversion_enabled: body.gift_conversion_enabled,
            require_banked_visit: body.require_banked_visit,
            welcome_once_per_session: body.welcome_once_per_session,
            welcome_gift_percentage: body.welcome_gift_percentage,
        }
    }
}

/// 存储健康检查状态
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct HealthStorageCheck {
    pub status: String,
    pub storage_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 健康检查响应
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u32,
    pub storage: HealthStorageCheck,
    pub response_time_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_order_defaults() {
        let body: PostOrder =
            serde_json::from_str(r#"{"deviceId":"d1","totalCents":1250}"#).unwrap();
        let req = SubmitOrderRequest::from(body);
        assert_eq!(req.device_id.as_deref(), Some("d1"));
        assert!(!req.loyalty_discount_applied);
        assert_eq!(req.loyalty_discount_amount_cents, 0);
        assert_eq!(req.gift_id, None);
    }

    #[test]
    fn test_status_response_is_camel_case() {
        let json = serde_json::to_value(StatusResponse {
            total_visits: 2,
            orders_in_current_visit: 1,
            total_points: 500,
            discount_eligible: true,
            has_unused_gift: false,
            gift_conversion_enabled: true,
            session_state: SessionState::OpenSession,
        })
        .unwrap();
        assert_eq!(json["totalVisits"], 2);
        assert_eq!(json["ordersInCurrentVisit"], 1);
        assert_eq!(json["sessionState"], "openSession");
    }

    #[test]
    fn export_typescript_types() {
        let cfg = ts_rs::Config::default();
        StatusResponse::export_all(&cfg).expect("Failed to export StatusResponse");
        PostOrder::export_all(&cfg).expect("Failed to export PostOrder");
        OrderResponse::export_all(&cfg).expect("Failed to export OrderResponse");
        GiftResponse::export_all(&cfg).expect("Failed to export GiftResponse");
        GiftActionRequest::export_all(&cfg).expect("Failed to export GiftActionRequest");
        GiftConversionResponse::export_all(&cfg).expect("Failed to export GiftConversionResponse");
        LedgerResponse::export_all(&cfg).expect("Failed to export LedgerResponse");
        SettingsResponse::export_all(&cfg).expect("Failed to export SettingsResponse");
        UpdateSettings::export_all(&cfg).expect("Failed to export UpdateSettings");
        HealthResponse::export_all(&cfg).expect("Failed to export HealthResponse");
    }
}
