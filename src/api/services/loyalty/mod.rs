//! Loyalty API 服务模块
//!
//! 点餐前端调用的端点：状态轮询、订单提交、礼品兑换与撤销、积分流水和餐厅配置。
//! 餐厅 ID 由认证网关通过 `X-Restaurant-Id` 请求头传入。

pub mod error_code;
mod gifts;
mod helpers;
mod ledger_ops;
pub mod routes;
mod types;
mod visits;

pub use types::*;

pub use helpers::{
    RESTAURANT_HEADER, api_result, error_from_loyalty, error_response, restaurant_id,
    success_response,
};

pub use error_code::ErrorCode;

pub use gifts::{convert_gift, list_gifts, revert_gift};
pub use ledger_ops::{get_ledger, get_settings, update_settings};
pub use visits::{get_status, post_order};
