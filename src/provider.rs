//! Shared plumbing for remote providers (embedding and generation).
//!
//! Both provider families speak HTTP through `reqwest` and share the same
//! failure taxonomy and retry discipline:
//! - HTTP 401/403 → [`ProviderError::Auth`], never retried
//! - HTTP 429 and 5xx → retry with exponential backoff
//! - other 4xx → [`ProviderError::Service`], never retried
//! - network errors → retry
//! - backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

/// Failure from a remote provider, distinguishable by kind so callers can
/// tell a bad credential from a transient service fault.
#[derive(Debug)]
pub enum ProviderError {
    Auth(String),
    Service(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Auth(e) => write!(f, "authentication failed: {}", e),
            ProviderError::Service(e) => write!(f, "service error: {}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    pub fn service(e: impl std::fmt::Display) -> Self {
        ProviderError::Service(e.to_string())
    }
}

/// Exponential backoff delay before retry `attempt` (1-based).
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1).min(5))
}

/// HTTP client with the provider's configured request timeout.
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(ProviderError::service)
}

/// Classify an HTTP error status. Returns `Ok(retryable)` for statuses the
/// caller should keep as `Service` errors, or the terminal error directly.
pub(crate) fn classify_status(status: reqwest::StatusCode, body: &str) -> (ProviderError, bool) {
    let code = status.as_u16();
    if code == 401 || code == 403 {
        return (
            ProviderError::Auth(format!("HTTP {}: {}", status, body)),
            false,
        );
    }
    let retryable = code == 429 || status.is_server_error();
    (
        ProviderError::Service(format!("HTTP {}: {}", status, body)),
        retryable,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_capped() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(6), Duration::from_secs(32));
        assert_eq!(backoff_delay(40), Duration::from_secs(32));
    }

    #[test]
    fn auth_statuses_are_terminal() {
        let (err, retry) = classify_status(reqwest::StatusCode::UNAUTHORIZED, "no key");
        assert!(matches!(err, ProviderError::Auth(_)));
        assert!(!retry);
    }

    #[test]
    fn rate_limit_is_retryable() {
        let (err, retry) = classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(err, ProviderError::Service(_)));
        assert!(retry);
    }

    #[test]
    fn client_errors_are_terminal() {
        let (_, retry) = classify_status(reqwest::StatusCode::BAD_REQUEST, "bad body");
        assert!(!retry);
    }
}
