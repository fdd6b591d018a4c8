// Retry with exponential backoff, timeout-bounded calls and cooperative shutdown

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use rand::Rng;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{info, warn};
use crate::config::RetryConfig;
use crate::error::{TradingError, TradingResult};

/// Retry mechanism with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
    jitter: bool,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
            jitter: true,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.multiplier,
        )
        .with_jitter(config.jitter)
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts run out. Failures come back as `CallFailed` naming
    /// `name`.
    pub async fn execute<F, Fut, T>(&self, name: &str, mut operation: F) -> TradingResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TradingResult<T>>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !error.is_retryable() || attempt >= self.max_attempts {
                        return Err(TradingError::CallFailed {
                            operation: name.to_string(),
                            attempts: attempt,
                            source: Box::new(error),
                        });
                    }

                    let wait = self.jittered(delay);
                    warn!(
                        "⚠️  {} failed (attempt {}/{}), retrying in {:?}: {}",
                        name, attempt, self.max_attempts, wait, error
                    );
                    sleep(wait).await;

                    // Exponential backoff
                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.backoff_multiplier) as u64
                        ),
                        self.max_delay,
                    );
                }
            }
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        // Up to a quarter of the delay on top
        let extra = rand::thread_rng().gen_range(0..=delay.as_millis() as u64 / 4);
        delay + Duration::from_millis(extra)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,                                    // 3 attempts
            Duration::from_millis(500),          // 500ms base delay
            Duration::from_secs(30),             // 30s max delay
            2.0,                                 // Double delay each time
        )
    }
}

/// Bound a collaborator call; elapsing maps to a retryable `ApiTimeout`.
pub async fn with_timeout<Fut, T>(limit: Duration, name: &str, call: Fut) -> TradingResult<T>
where
    Fut: Future<Output = TradingResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(TradingError::ApiTimeout(format!(
            "{} did not complete within {:?}",
            name, limit
        ))),
    }
}

/// Cloneable stop flag shared between the CLI and a running session.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    stopped: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initiate_shutdown(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            info!("🛑 Graceful shutdown initiated");
        }
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been initiated.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_shutting_down() {
                return;
            }
            notified.await;
        }
    }
}
