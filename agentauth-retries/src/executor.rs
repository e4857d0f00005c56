//! Run a broker call under a [`RetryConfig`].

use crate::config::RetryConfig;
use crate::error::{RetryResult, RetryableError};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// What a retried call cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryReport {
    /// Attempts issued, including the first.
    pub attempts: u32,
    /// Time spent sleeping between attempts.
    pub waited: Duration,
}

/// Run `operation`, retrying transient failures.
///
/// At most `config.max_retries + 1` attempts are made. Waits use
/// `tokio::time::sleep`, so only the calling task is suspended.
///
/// ```ignore
/// let status = with_retry(&RetryConfig::for_broker(2), || broker.check_session("S1")).await?;
/// ```
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> RetryResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = RetryResult<T>>,
{
    with_retry_report(config, operation).await.0
}

/// Like [`with_retry`], also reporting attempts and time waited.
pub async fn with_retry_report<F, Fut, T>(
    config: &RetryConfig,
    operation: F,
) -> (RetryResult<T>, RetryReport)
where
    F: Fn() -> Fut,
    Fut: Future<Output = RetryResult<T>>,
{
    let mut report = RetryReport::default();

    loop {
        report.attempts += 1;
        let error: RetryableError = match operation().await {
            Ok(value) => return (Ok(value), report),
            Err(error) => error,
        };

        let retries_used = report.attempts - 1;
        if retries_used >= config.max_retries || !config.should_retry(&error) {
            if error.is_retryable() {
                warn!(attempts = report.attempts, error = %error, "Broker call failed after retries");
            }
            return (Err(error), report);
        }

        let wait = config.delay_for(report.attempts, error.retry_after());
        debug!(
            attempt = report.attempts,
            wait_ms = wait.as_millis() as u64,
            error = %error,
            "Retrying broker call"
        );
        report.waited += wait;
        sleep(wait).await;
    }
}
