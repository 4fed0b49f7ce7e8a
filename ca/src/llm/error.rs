//! LLM error types

use std::time::Duration;
use thiserror::Error;

use crate::retry;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown LLM provider: '{0}'. Supported: openai")]
    UnknownProvider(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether another attempt could succeed
    ///
    /// Transport failures and transient statuses qualify; a body that fails
    /// to decode does not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => retry::is_transient_status(*status),
            LlmError::Network(e) => !e.is_decode() && !e.is_builder(),
            LlmError::InvalidResponse(_) | LlmError::UnknownProvider(_) | LlmError::Json(_) => false,
        }
    }

    /// How long to wait before retry number `attempt`
    ///
    /// A server-provided `Retry-After` wins over the doubling backoff.
    pub fn retry_delay(&self, initial: Duration, attempt: u32) -> Duration {
        match self {
            LlmError::RateLimited {
                retry_after: Some(after),
            } => *after,
            _ => retry::backoff(initial, attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> LlmError {
        LlmError::ApiError {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_transient_failures_are_retryable() {
        assert!(LlmError::RateLimited { retry_after: None }.is_retryable());
        assert!(api(408).is_retryable());
        assert!(api(503).is_retryable());
    }

    #[test]
    fn test_permanent_failures_are_not_retryable() {
        assert!(!api(400).is_retryable());
        assert!(!api(401).is_retryable());
        // 501 Not Implemented will not change on retry
        assert!(!api(501).is_retryable());
        assert!(!LlmError::InvalidResponse("Bad JSON".to_string()).is_retryable());
        assert!(!LlmError::UnknownProvider("bard".to_string()).is_retryable());
    }

    #[test]
    fn test_retry_delay_prefers_retry_after() {
        let initial = Duration::from_millis(100);
        let limited = LlmError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(limited.retry_delay(initial, 3), Duration::from_secs(2));

        let unhinted = LlmError::RateLimited { retry_after: None };
        assert_eq!(unhinted.retry_delay(initial, 3), Duration::from_millis(400));
        assert_eq!(api(503).retry_delay(initial, 1), Duration::from_millis(100));
    }
}
