//! Failure classification and retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use studium_core::defaults::{RETRY_BACKOFF_FACTOR, RETRY_BASE_DELAY_MS, RETRY_MAX_ATTEMPTS};
use studium_core::{Error, ProviderErrorKind, Result};

/// Classify an HTTP status code into a provider error kind.
pub fn classify_status(status: u16) -> ProviderErrorKind {
    match status {
        401 | 403 => ProviderErrorKind::Auth,
        429 => ProviderErrorKind::RateLimit,
        404 => ProviderErrorKind::NotFound,
        400..=499 => ProviderErrorKind::BadRequest,
        _ => ProviderErrorKind::Server,
    }
}

/// Build a provider error from a failed HTTP response's status and body.
pub fn provider_error(status: u16, body: &str, context: &str) -> Error {
    Error::provider(
        classify_status(status),
        format!("{} returned {}: {}", context, status, body.trim()),
    )
}

/// Run an operation, retrying retryable provider failures with exponential
/// backoff (100 ms base, ×1.5 per attempt, 3 attempts total).
pub async fn with_backoff<T, F, Fut>(op_name: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < RETRY_MAX_ATTEMPTS => {
                warn!(
                    op = op_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retryable provider failure, backing off"
                );
                tokio::time::sleep(delay).await;
                delay = Duration::from_millis((delay.as_millis() as f64 * RETRY_BACKOFF_FACTOR) as u64);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn classify_maps_statuses() {
        assert_eq!(classify_status(401), ProviderErrorKind::Auth);
        assert_eq!(classify_status(403), ProviderErrorKind::Auth);
        assert_eq!(classify_status(429), ProviderErrorKind::RateLimit);
        assert_eq!(classify_status(404), ProviderErrorKind::NotFound);
        assert_eq!(classify_status(422), ProviderErrorKind::BadRequest);
        assert_eq!(classify_status(500), ProviderErrorKind::Server);
        assert_eq!(classify_status(503), ProviderErrorKind::Server);
    }

    #[tokio::test]
    async fn backoff_retries_retryable_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_backoff("test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::provider(ProviderErrorKind::Network, "timeout"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn backoff_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_backoff("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::provider(ProviderErrorKind::Server, "boom")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), RETRY_MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn backoff_does_not_retry_auth_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_backoff("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::provider(ProviderErrorKind::Auth, "bad key")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
