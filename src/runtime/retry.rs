//! Retry policy for workstream execution
//!
//! One policy covers every retry loop: `max_retries` extra attempts after
//! the first, with a pluggable delay between attempts.
//!
//! # Example
//!
//! ```rust,ignore
//! use sdp::runtime::{Backoff, RetryPolicy};
//!
//! let policy = RetryPolicy::new(2).with_backoff(Backoff::Fixed(Duration::from_secs(2)));
//! let (value, attempts) = policy
//!     .execute(|attempt| async move { flaky_call(attempt).await }, |_, _| {})
//!     .await?;
//! ```

use std::future::Future;
use std::time::Duration;

/// Delay between attempts
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Backoff {
    /// Retry immediately
    #[default]
    None,
    /// Same delay before every retry
    Fixed(Duration),
    /// `initial * multiplier^retry`, capped at `max`, with optional jitter (0.0 to 1.0)
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
        jitter: f64,
    },
}

impl Backoff {
    /// Exponential backoff without jitter
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self::Exponential {
            initial,
            max,
            multiplier: 2.0,
            jitter: 0.0,
        }
    }

    /// Delay before retry number `retry` (0-indexed)
    pub fn delay(&self, retry: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => *delay,
            Self::Exponential {
                initial,
                max,
                multiplier,
                jitter,
            } => {
                let base = initial.as_millis() as f64 * multiplier.powi(retry as i32);
                let capped = base.min(max.as_millis() as f64);

                let jitter = jitter.clamp(0.0, 1.0);
                let delayed = if jitter > 0.0 {
                    let range = capped * jitter;
                    let offset = rand::random::<f64>() * range * 2.0 - range;
                    (capped + offset).max(0.0)
                } else {
                    capped
                };

                Duration::from_millis(delayed as u64)
            }
        }
    }
}

/// Final failure after the attempt budget is spent
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Retry budget plus backoff
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

impl RetryPolicy {
    /// `max_retries` extra attempts, no delay
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Run `operation` until it succeeds or the budget is spent.
    ///
    /// `operation` receives the 1-based attempt number. `on_retry` is called
    /// with the next attempt number and the error that triggered it, before
    /// the backoff delay. Returns the value and the attempts used; only the
    /// last error is surfaced.
    pub async fn execute<T, E, F, Fut, H>(
        &self,
        mut operation: F,
        mut on_retry: H,
    ) -> Result<(T, u32), RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        H: FnMut(u32, &E),
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok((value, attempt)),
                Err(error) => {
                    if attempt >= max_attempts {
                        return Err(RetryExhausted {
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    on_retry(attempt + 1, &error);

                    let delay = self.backoff.delay(attempt - 1);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
