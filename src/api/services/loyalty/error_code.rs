//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};
use ts_rs::TS;

use crate::errors::LoyaltyError;
use crate::storage::models::TS_EXPORT_PATH;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，ts-rs 自动生成 TypeScript 类型。
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 忠诚度规则错误
/// - 5000-5099: 配置错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[ts(rename = "ErrorCode")]
#[ts(repr(enum))]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    MissingRestaurant = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 忠诚度规则错误 3000-3099
    GiftInvalidState = 3000,
    RewardNotEligible = 3001,
    LoyaltyDatabaseError = 3005,

    // 配置错误 5000-5099
    ConfigInvalid = 5000,
}

impl From<&LoyaltyError> for ErrorCode {
    fn from(err: &LoyaltyError) -> Self {
        match err {
            LoyaltyError::Validation(_) => ErrorCode::BadRequest,
            LoyaltyError::NotFound(_) => ErrorCode::NotFound,
            LoyaltyError::InvalidState(_) => ErrorCode::GiftInvalidState,
            LoyaltyError::Forbidden(_) => ErrorCode::Forbidden,
            LoyaltyError::NotEligible(_) => ErrorCode::RewardNotEligible,
            LoyaltyError::DatabaseOperation(_) => ErrorCode::LoyaltyDatabaseError,
            LoyaltyError::DatabaseConnection(_) => ErrorCode::ServiceUnavailable,
            LoyaltyError::DatabaseConfig(_) => ErrorCode::ConfigInvalid,
            LoyaltyError::Serialization(_) => ErrorCode::InternalServerError,
        }
    }
}
