//! Loyalty API：礼品列表、兑换积分与撤销兑换

use actix_web::{HttpRequest, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::trace;

use crate::services::LoyaltyService;

use super::helpers::{api_result, error_from_loyalty, restaurant_id};
use super::types::{GiftActionRequest, GiftConversionResponse, GiftResponse};

/// GET /loyalty/gifts/{device_id}
pub async fn list_gifts(
    req: HttpRequest,
    path: web::Path<String>,
    service: web::Data<Arc<LoyaltyService>>,
) -> ActixResult<impl Responder> {
    let restaurant_id = match restaurant_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(error_from_loyalty(&e)),
    };
    let device_id = path.into_inner();

    let result = service
        .list_gifts(&restaurant_id, &device_id)
        .await
        .map(|gifts| gifts.into_iter().map(GiftResponse::from).collect::<Vec<_>>());
    Ok(api_result(result))
}

/// POST /loyalty/gifts/{gift_id}/convert
pub async fn convert_gift(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<GiftActionRequest>,
    service: web::Data<Arc<LoyaltyService>>,
) -> ActixResult<impl Responder> {
    let restaurant_id = match restaurant_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(error_from_loyalty(&e)),
    };
    let gift_id = path.into_inner();
    trace!(
        "Loyalty API: convert gift {} for {}/{}",
        gift_id, restaurant_id, body.device_id
    );

    let result = service
        .convert_gift(&restaurant_id, &body.device_id, gift_id)
        .await
        .map(GiftConversionResponse::from);
    Ok(api_result(result))
}

/// POST /loyalty/gifts/{gift_id}/revert
pub async fn revert_gift(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<GiftActionRequest>,
    service: web::Data<Arc<LoyaltyService>>,
) -> ActixResult<impl Responder> {
    let restaurant_id = match restaurant_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(error_from_loyalty(&e)),
    };
    let gift_id = path.into_inner();
    trace!(
        "Loyalty API: revert gift {} for {}/{}",
        gift_id, restaurant_id, body.device_id
    );

    let result = service
        .revert_gift_conversion(&restaurant_id, &body.device_id, gift_id)
        .await
        .map(GiftConversionResponse::from);
    Ok(api_result(result))
}
