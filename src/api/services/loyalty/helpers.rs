//! Loyalty API 帮助函数

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::error;

use crate::errors::LoyaltyError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 认证网关注入的餐厅 ID 请求头
pub const RESTAURANT_HEADER: &str = "X-Restaurant-Id";

/// 读取 `X-Restaurant-Id`，缺失或为空时返回 Validation 错误
pub fn restaurant_id(req: &HttpRequest) -> Result<String, LoyaltyError> {
    req.headers()
        .get(RESTAURANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            LoyaltyError::validation(format!("missing {} header", RESTAURANT_HEADER))
        })
}

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 LoyaltyError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
///
/// 存储层错误只记录日志，对外返回通用信息。
pub fn error_from_loyalty(err: &LoyaltyError) -> HttpResponse {
    let status = err.http_status();
    let error_code = ErrorCode::from(err);
    if err.is_internal() {
        error!("Loyalty API internal error: {}", err);
        return error_response(status, error_code, "Internal server error, please retry");
    }
    error_response(status, error_code, err.message())
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: Result<T, LoyaltyError>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_loyalty(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_restaurant_id_header() {
        let req = TestRequest::default()
            .insert_header((RESTAURANT_HEADER, " r-42 "))
            .to_http_request();
        assert_eq!(restaurant_id(&req).unwrap(), "r-42");

        let missing = TestRequest::default().to_http_request();
        assert!(matches!(
            restaurant_id(&missing),
            Err(LoyaltyError::Validation(_))
        ));
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let resp = error_from_loyalty(&LoyaltyError::database_operation("disk I/O error"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = error_from_loyalty(&LoyaltyError::not_eligible("first session"));
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
