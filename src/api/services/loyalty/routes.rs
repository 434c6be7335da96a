//! Loyalty API 路由配置

use actix_web::web;

use super::gifts::{convert_gift, list_gifts, revert_gift};
use super::ledger_ops::{get_ledger, get_settings, update_settings};
use super::visits::{get_status, post_order};

/// 忠诚度路由 `/loyalty`
///
/// 包含：
/// - GET /loyalty/status/{device_id} - 状态轮询（会话心跳）
/// - GET /loyalty/gifts/{device_id} - 礼品列表
/// - POST /loyalty/gifts/{gift_id}/convert - 礼品兑换积分
/// - POST /loyalty/gifts/{gift_id}/revert - 撤销兑换
/// - GET /loyalty/ledger/{device_id} - 积分流水
/// - GET/PUT /loyalty/settings - 餐厅配置
pub fn loyalty_routes() -> actix_web::Scope {
    web::scope("/loyalty")
        .route("/status/{device_id}", web::get().to(get_status))
        .route("/gifts/{gift_id}/convert", web::post().to(convert_gift))
        .route("/gifts/{gift_id}/revert", web::post().to(revert_gift))
        .route("/gifts/{device_id}", web::get().to(list_gifts))
        .route("/ledger/{device_id}", web::get().to(get_ledger))
        .route("/settings", web::get().to(get_settings))
        .route("/settings", web::put().to(update_settings))
}

/// 订单路由 `/orders`
pub fn orders_routes() -> actix_web::Scope {
    web::scope("/orders").route("", web::post().to(post_order))
}

/// Loyalty API v1 路由
pub fn loyalty_v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .service(loyalty_routes())
        .service(orders_routes())
}
