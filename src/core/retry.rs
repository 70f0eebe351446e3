//! Reusable retry policy for backend calls
//!
//! Every network unit of work (a page fetch, a folder listing, an object
//! download) runs through [`RetryPolicy::run`]. `max_attempts` counts the
//! first attempt, so the default of 3 means at most two retries.

use crate::config::RetryConfig;
use crate::core::shutdown::ShutdownSignal;
use crate::domain::{BackendError, FerryError};
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Errors that may succeed when the same operation is attempted again
pub trait Retryable {
    /// Whether another attempt could plausibly succeed
    fn is_retryable(&self) -> bool;
}

impl Retryable for BackendError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

impl Retryable for FerryError {
    fn is_retryable(&self) -> bool {
        match self {
            FerryError::Backend(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Shape of the delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * attempt`
    Linear,
    /// `base * 2^(attempt - 1)`
    Exponential,
}

/// The operation did not succeed
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Attempts actually made
    pub attempts: usize,

    /// Error returned by the last attempt
    pub last_error: E,

    /// Retrying stopped because shutdown was requested
    pub cancelled: bool,
}

impl<E: Display> Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (after {} attempt", self.last_error, self.attempts)?;
        if self.attempts != 1 {
            write!(f, "s")?;
        }
        write!(f, ")")
    }
}

/// Retry policy shared by all backend operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
    backoff: Backoff,
    jitter: bool,
}

impl RetryPolicy {
    /// Linear policy with the given attempt budget and base delay
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(30),
            backoff: Backoff::Linear,
            jitter: false,
        }
    }

    /// Build a policy from the `[backend.retry]` section
    pub fn from_config(config: &RetryConfig) -> Self {
        let backoff = match config.backoff.as_str() {
            "exponential" => Backoff::Exponential,
            _ => Backoff::Linear,
        };
        Self::new(config.max_retries, Duration::from_millis(config.base_delay_ms))
            .with_backoff(backoff)
            .with_max_delay(Duration::from_millis(config.max_delay_ms))
            .with_jitter(config.jitter)
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let attempt = attempt.max(1) as u32;
        let delay = match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                self.base_delay.saturating_mul(factor)
            }
        };
        let delay = delay.min(self.max_delay);

        if self.jitter {
            let scale = rand::thread_rng().gen_range(0.5..=1.0);
            delay.mul_f64(scale)
        } else {
            delay
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, op: F) -> Result<T, RetryExhausted<E>>
    where
        E: Retryable + Display,
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_until(operation, &ShutdownSignal::never(), op).await
    }

    /// Like [`run`](Self::run), but stops waiting between attempts as soon as
    /// shutdown is requested
    pub async fn run_until<T, E, F, Fut>(
        &self,
        operation: &str,
        shutdown: &ShutdownSignal,
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        E: Retryable + Display,
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(operation, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !error.is_retryable() || attempt >= self.max_attempts {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: error,
                    cancelled: false,
                });
            }

            let delay = self.delay_for(attempt);
            crate::log_retry_attempt!(operation, attempt + 1, self.max_attempts, error);

            tokio::select! {
                _ = shutdown.wait() => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: error,
                        cancelled: true,
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
