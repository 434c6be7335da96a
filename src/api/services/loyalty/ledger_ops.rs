//! Loyalty API：积分流水与餐厅配置

use actix_web::{HttpRequest, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::info;

use crate::services::LoyaltyService;

use super::helpers::{api_result, error_from_loyalty, restaurant_id};
use super::types::{LedgerResponse, SettingsResponse, UpdateSettings};

/// GET /loyalty/ledger/{device_id}
pub async fn get_ledger(
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
        .ledger(&restaurant_id, &device_id)
        .await
        .map(LedgerResponse::from);
    Ok(api_result(result))
}

/// GET /loyalty/settings
pub async fn get_settings(
    req: HttpRequest,
    service: web::Data<Arc<LoyaltyService>>,
) -> ActixResult<impl Responder> {
    let restaurant_id = match restaurant_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(error_from_loyalty(&e)),
    };

    let result = service
        .get_settings(&restaurant_id)
        .await
        .map(SettingsResponse::from);
    Ok(api_result(result))
}

/// PUT /loyalty/settings
pub async fn update_settings(
    req: HttpRequest,
    body: web::Json<UpdateSettings>,
    service: web::Data<Arc<LoyaltyService>>,
) -> ActixResult<impl Responder> {
    let restaurant_id = match restaurant_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(error_from_loyalty(&e)),
    };

    let result = service
        .update_settings(&restaurant_id, body.into_inner().into())
        .await
        .map(SettingsResponse::from);
    if result.is_ok() {
        info!("Loyalty API: settings updated for {}", restaurant_id);
    }
    Ok(api_result(result))
}
