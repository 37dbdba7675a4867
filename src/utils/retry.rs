use crate::utils::error::{QuanterraError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};

fn default_max_attempts() -> usize {
    3
}

fn default_initial_backoff_secs() -> u64 {
    4
}

fn default_max_backoff_secs() -> u64 {
    10
}

/// Retry policy for upstream API calls, shared by every data source client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff delays with jitter, one entry per retry.
    ///
    /// With the defaults this yields ~4s then ~8s, capped at 10s, so a
    /// request is attempted at most three times.
    pub fn strategy(&self) -> impl Iterator<Item = Duration> + Send {
        let initial_ms = self.initial_backoff_secs.saturating_mul(1000);

        // ExponentialBackoff uses base^n * factor. With base=2 and
        // factor=initial_ms/2 the first delay equals initial_ms. Clamping
        // the factor to 1 keeps sub-2ms values from truncating to zero.
        let factor = (initial_ms / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(Duration::from_secs(self.max_backoff_secs))
            .map(jitter)
            .take(self.max_attempts.saturating_sub(1))
    }
}

fn is_retryable(err: &QuanterraError) -> bool {
    matches!(
        err,
        QuanterraError::ApiError(_) | QuanterraError::ApiStatusError { .. }
    )
}

/// Runs `operation`, retrying transient API failures per `config`.
///
/// Non-network errors are returned immediately; the last error is returned
/// once the attempt budget is spent.
pub async fn retry_request<T, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delays = config.strategy();
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retryable(&err) => match delays.next() {
                Some(delay) => {
                    tracing::warn!(
                        "Request failed with {}. Retrying in {:.1}s...",
                        err,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(err),
            },
            Err(err) => return Err(err),
        }
    }
}
