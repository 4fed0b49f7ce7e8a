//! Retry timing shared by the HTTP clients

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

/// First backoff delay; doubles with every further attempt
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

/// Upper bound on any single wait between attempts
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Doubling stops here; 2^16 seconds is far past MAX_BACKOFF anyway
const MAX_DOUBLINGS: u32 = 16;

/// Status codes worth another attempt
///
/// 503 also means a hosted model is still loading.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Delay before retry number `attempt` (1-based)
pub fn backoff(initial: Duration, attempt: u32) -> Duration {
    let doublings = attempt.saturating_sub(1).min(MAX_DOUBLINGS);
    initial.saturating_mul(1u32 << doublings).min(MAX_BACKOFF)
}

/// `Retry-After` in whole seconds; HTTP dates are ignored
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_BACKOFF))
}
