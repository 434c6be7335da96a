//! Read-side retry with exponential backoff
//!
//! Only idempotent reads go through here. Transactions that move points or
//! gift state never retry on their own; a failure rolls back and surfaces to
//! the caller.

use sea_orm::DbErr;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// How a failed database call should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Pool exhausted or connection dropped
    Transient,
    /// Deadlock, lock wait timeout, SQLite busy
    Contention,
    Permanent,
}

impl FailureKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, FailureKind::Permanent)
    }
}

pub fn classify(err: &DbErr) -> FailureKind {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => FailureKind::Transient,
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => classify_runtime(runtime_err),
        _ => FailureKind::Permanent,
    }
}

fn classify_runtime(err: &sea_orm::error::RuntimeErr) -> FailureKind {
    use sea_orm::error::RuntimeErr;

    let message = match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            if let Some(code) = sqlx_err
                .deref()
                .as_database_error()
                .and_then(|db_err| db_err.code())
            {
                // MySQL 1213/1205, PostgreSQL 40001/40P01, SQLite BUSY/LOCKED
                return match code.as_ref() {
                    "1213" | "1205" | "40001" | "40P01" | "5" | "6" => FailureKind::Contention,
                    _ => FailureKind::Permanent,
                };
            }
            sqlx_err.to_string()
        }
        RuntimeErr::Internal(msg) => msg.clone(),
        #[allow(unreachable_patterns)]
        _ => return FailureKind::Permanent,
    };

    let message = message.to_lowercase();
    if ["deadlock", "lock wait timeout", "database is locked", "serialization failure"]
        .iter()
        .any(|needle| message.contains(needle))
    {
        FailureKind::Contention
    } else {
        FailureKind::Permanent
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl From<&DatabaseConfig> for RetryConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently or runs out of retries
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("'{}' succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let kind = classify(&err);
        if !kind.is_retryable() || attempt >= config.max_retries {
            debug!("'{}' gave up ({:?}): {}", operation_name, kind, err);
            return Err(err);
        }

        attempt += 1;
        let delay = backoff_delay(attempt, config.base_delay_ms, config.max_delay_ms);
        warn!(
            "'{}' failed ({:?}, attempt {}/{}): {}; retrying in {} ms",
            operation_name,
            kind,
            attempt,
            config.max_retries + 1,
            err,
            delay
        );
        sleep(Duration::from_millis(delay)).await;
    }
}

/// base * 2^(attempt-1), capped, plus up to 25% jitter
fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    use rand::RngExt;
    let capped = base_ms
        .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
        .min(max_ms);
    let jitter = rand::rng().random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}
