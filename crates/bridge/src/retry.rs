//! Connection-aware retries with exponential backoff.
//!
//! Before each attempt the executor repairs a connection that is marked down;
//! if the repair fails the call ends immediately. Failed attempts are retried
//! only when their message looks like a connectivity problem. The check is
//! textual and independent of the structured [`ErrorKind`]
//! (a message mentioning "connection" is retried even when classified
//! `Unknown`).
//!
//! [`ErrorKind`]: focusbridge_types::ErrorKind

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::monitor::ConnectionMonitor;

/// Lower-case phrases that make a failure retryable.
pub const RETRYABLE_PHRASES: &[&str] = &["not running", "unavailable", "connection", "timed out"];

/// Whether a failure message indicates a transient connectivity problem.
pub fn is_retryable(message: &str) -> bool {
    let message = message.to_lowercase();
    RETRYABLE_PHRASES.iter().any(|phrase| message.contains(phrase))
}

/// Runs operations with connection repair and bounded retries.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    monitor: Arc<ConnectionMonitor>,
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryExecutor {
    pub fn new(monitor: Arc<ConnectionMonitor>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            monitor,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Copy of this executor with a different attempt budget.
    pub fn with_max_attempts(&self, max_attempts: u32) -> Self {
        Self::new(Arc::clone(&self.monitor), max_attempts, self.base_delay)
    }

    /// Delay before the retry that follows failed attempt `attempt` (0-indexed).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// The last failure is returned unchanged.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, BridgeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            if !self.monitor.is_connected().await && !self.monitor.ensure_connected().await {
                let status = self.monitor.status().await;
                let message = status
                    .error
                    .unwrap_or_else(|| self.monitor.not_running_message());
                warn!(attempt = attempt + 1, "connection repair failed: {}", message);
                return Err(BridgeError::connectivity(message));
            }

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempts = attempt + 1, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let message = error.to_string();
            let attempts_left = attempt + 1 < self.max_attempts;
            if !attempts_left || !is_retryable(&message) {
                return Err(error);
            }

            let delay = self.backoff_delay(attempt);
            warn!(
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying after connectivity failure: {}",
                message
            );
            self.monitor.mark_disconnected(message).await;
            sleep(delay).await;
            attempt += 1;
        }
    }
}
