use std::fmt;

#[derive(Debug, Clone)]
pub enum LoyaltyError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    NotFound(String),
    InvalidState(String),
    Forbidden(String),
    NotEligible(String),
    Serialization(String),
}

impl LoyaltyError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LoyaltyError::DatabaseConfig(_) => "E001",
            LoyaltyError::DatabaseConnection(_) => "E002",
            LoyaltyError::DatabaseOperation(_) => "E003",
            LoyaltyError::Validation(_) => "E004",
            LoyaltyError::NotFound(_) => "E005",
            LoyaltyError::InvalidState(_) => "E006",
            LoyaltyError::Forbidden(_) => "E007",
            LoyaltyError::NotEligible(_) => "E008",
            LoyaltyError::Serialization(_) => "E009",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LoyaltyError::DatabaseConfig(_) => "Database Configuration Error",
            LoyaltyError::DatabaseConnection(_) => "Database Connection Error",
            LoyaltyError::DatabaseOperation(_) => "Database Operation Error",
            LoyaltyError::Validation(_) => "Validation Error",
            LoyaltyError::NotFound(_) => "Resource Not Found",
            LoyaltyError::InvalidState(_) => "Invalid State",
            LoyaltyError::Forbidden(_) => "Forbidden",
            LoyaltyError::NotEligible(_) => "Not Eligible",
            LoyaltyError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LoyaltyError::DatabaseConfig(msg) => msg,
            LoyaltyError::DatabaseConnection(msg) => msg,
            LoyaltyError::DatabaseOperation(msg) => msg,
            LoyaltyError::Validation(msg) => msg,
            LoyaltyError::NotFound(msg) => msg,
            LoyaltyError::InvalidState(msg) => msg,
            LoyaltyError::Forbidden(msg) => msg,
            LoyaltyError::NotEligible(msg) => msg,
            LoyaltyError::Serialization(msg) => msg,
        }
    }

    /// Store/transaction failures. The caller sees a generic failure and may retry.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            LoyaltyError::DatabaseConfig(_)
                | LoyaltyError::DatabaseConnection(_)
                | LoyaltyError::DatabaseOperation(_)
                | LoyaltyError::Serialization(_)
        )
    }

    /// 映射 HTTP 状态码
    pub fn http_status(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            LoyaltyError::Validation(_) => StatusCode::BAD_REQUEST,
            LoyaltyError::NotFound(_) => StatusCode::NOT_FOUND,
            LoyaltyError::InvalidState(_) => StatusCode::CONFLICT,
            LoyaltyError::Forbidden(_) => StatusCode::FORBIDDEN,
            LoyaltyError::NotEligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LoyaltyError::DatabaseConfig(_)
            | LoyaltyError::DatabaseConnection(_)
            | LoyaltyError::DatabaseOperation(_)
            | LoyaltyError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LoyaltyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LoyaltyError {}

// 便捷的构造函数
impl LoyaltyError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LoyaltyError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LoyaltyError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LoyaltyError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LoyaltyError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LoyaltyError::NotFound(msg.into())
    }

    pub fn invalid_state<T: Into<String>>(msg: T) -> Self {
        LoyaltyError::InvalidState(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        LoyaltyError::Forbidden(msg.into())
    }

    pub fn not_eligible<T: Into<String>>(msg: T) -> Self {
        LoyaltyError::NotEligible(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LoyaltyError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LoyaltyError {
    fn from(err: sea_orm::DbErr) -> Self {
        LoyaltyError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LoyaltyError {
    fn from(err: serde_json::Error) -> Self {
        LoyaltyError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoyaltyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_lifecycle_errors_map_to_client_statuses() {
        assert_eq!(
            LoyaltyError::not_found("gift 7").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LoyaltyError::invalid_state("already converted").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LoyaltyError::forbidden("conversion disabled").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            LoyaltyError::not_eligible("first session").http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_db_err_becomes_internal() {
        let err: LoyaltyError = sea_orm::DbErr::Custom("connection reset".to_string()).into();
        assert!(err.is_internal());
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().contains("connection reset"));
    }

    #[test]
    fn test_format_simple_includes_type_and_message() {
        let err = LoyaltyError::validation("device_id is required");
        assert_eq!(err.to_string(), "Validation Error: device_id is required");
        assert!(!err.is_internal());
    }
}
