//! LoyaltyError tests

use actix_web::http::StatusCode;
use tabletrail::errors::LoyaltyError;

#[test]
fn test_error_codes_are_unique() {
    let errors = [
        LoyaltyError::database_config("x"),
        LoyaltyError::database_connection("x"),
        LoyaltyError::database_operation("x"),
        LoyaltyError::validation("x"),
        LoyaltyError::not_found("x"),
        LoyaltyError::invalid_state("x"),
        LoyaltyError::forbidden("x"),
        LoyaltyError::not_eligible("x"),
        LoyaltyError::serialization("x"),
    ];
    let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn test_client_errors_are_not_internal() {
    for err in [
        LoyaltyError::validation("bad device id"),
        LoyaltyError::not_found("gift 3"),
        LoyaltyError::invalid_state("gift already converted"),
        LoyaltyError::forbidden("conversion disabled"),
        LoyaltyError::not_eligible("not eligible in first session"),
    ] {
        assert!(!err.is_internal(), "{} should be a client error", err);
        assert!(err.http_status().is_client_error());
    }
}

#[test]
fn test_store_errors_are_internal() {
    let err = LoyaltyError::database_connection("pool timed out");
    assert!(err.is_internal());
    assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_serde_json_error_conversion() {
    let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
    let err: LoyaltyError = parse.unwrap_err().into();
    assert!(matches!(err, LoyaltyError::Serialization(_)));
    assert_eq!(err.code(), "E009");
}

#[test]
fn test_format_colored_contains_code() {
    colored::control::set_override(false);
    let err = LoyaltyError::not_eligible("welcome reward already claimed");
    let formatted = err.format_colored();
    assert!(formatted.contains("E008"));
    assert!(formatted.contains("Not Eligible"));
    assert!(formatted.contains("welcome reward already claimed"));
}
