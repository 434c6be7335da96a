//! Loyalty API：状态轮询与订单提交

use actix_web::{HttpRequest, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::trace;

use crate::services::LoyaltyService;

use super::helpers::{api_result, error_from_loyalty, restaurant_id};
use super::types::{OrderResponse, PostOrder, StatusResponse};

/// GET /loyalty/status/{device_id}
///
/// 轮询同时也是一次会话活动：会续期或开启新的会话窗口。
pub async fn get_status(
    req: HttpRequest,
    path: web::Path<String>,
    service: web::Data<Arc<LoyaltyService>>,
) -> ActixResult<impl Responder> {
    let restaurant_id = match restaurant_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(error_from_loyalty(&e)),
    };
    let device_id = path.into_inner();
    trace!("Loyalty API: status poll {}/{}", restaurant_id, device_id);

    let result = service
        .status(&restaurant_id, &device_id)
        .await
        .map(StatusResponse::from);
    Ok(api_result(result))
}

/// POST /orders
pub async fn post_order(
    req: HttpRequest,
    body: web::Json<PostOrder>,
    service: web::Data<Arc<LoyaltyService>>,
) -> ActixResult<impl Responder> {
    let restaurant_id = match restaurant_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(error_from_loyalty(&e)),
    };
    let body = body.into_inner();
    trace!(
        "Loyalty API: order for {} (device: {:?}, gift: {:?})",
        restaurant_id, body.device_id, body.gift_id
    );

    let result = service
        .submit_order(&restaurant_id, body.into())
        .await
        .map(OrderResponse::from);
    Ok(api_result(result))
}
