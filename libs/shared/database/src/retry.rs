use std::future::Future;
use std::time::Duration;

use tracing::warn;

use shared_config::AppConfig;

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.store_retry_attempts,
            backoff: Duration::from_millis(config.store_retry_backoff_ms),
        }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(100),
        }
    }
}

/// Runs `op`, retrying transient store failures with linear backoff.
/// Every other error is returned on first sight.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, operation: &str, mut op: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(StoreError::Unavailable(msg)) if attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    "{} failed ({}), retrying attempt {}/{}",
                    operation, msg, attempt, policy.max_retries
                );
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            other => return other,
        }
    }
}
