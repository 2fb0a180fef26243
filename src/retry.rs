//! Bounded retry of remote calls
//!
//! A call is retried until it succeeds, returns a terminal error, or the
//! policy's deadline passes. Classification is the caller's job: the closure
//! wraps each failure as [`RetryError::Retryable`] or
//! [`RetryError::NonRetryable`], usually through [`retry_error`].

use crate::tencentcloud::error::SdkError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Deadline for read-only calls (Describe*)
pub const READ_RETRY_TIMEOUT: Duration = Duration::from_secs(3 * 60);
/// Deadline for mutating calls (Create*/Modify*/Delete*)
pub const WRITE_RETRY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Error codes that are always worth another attempt
pub const RETRYABLE_ERROR_CODES: &[&str] = &[
    // client
    "ClientError.NetworkError",
    "ClientError.HttpStatusCodeError",
    // common
    "FailedOperation",
    "InternalError",
    "TradeUnknownError",
    "RequestLimitExceeded",
    "ResourceInUse",
    "ResourceInsufficient",
    "ResourceUnavailable",
    // cbs
    "ResourceBusy",
];

/// Outcome of one failed attempt
#[derive(Debug)]
pub enum RetryError<E> {
    Retryable(E),
    NonRetryable(E),
}

impl<E> RetryError<E> {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RetryError::Retryable(_))
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Retryable(e) | RetryError::NonRetryable(e) => e,
        }
    }
}

/// Delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately
    None,
    Fixed(Duration),
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the `attempt`-th failure (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => d,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1).min(31));
                initial.saturating_mul(factor).min(max)
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_duration: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_duration: Duration) -> Self {
        Self {
            max_duration,
            backoff: Backoff::None,
        }
    }

    pub fn read() -> Self {
        Self::new(READ_RETRY_TIMEOUT)
    }

    pub fn write() -> Self {
        Self::new(WRITE_RETRY_TIMEOUT)
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::read()
    }
}

/// Run `op` until it succeeds, fails terminally, or the deadline passes.
///
/// On deadline exhaustion the last observed error is returned.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: Display,
{
    let deadline = Instant::now() + policy.max_duration;
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);

        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!("succeeded after {} attempts", attempt);
                }
                return Ok(value);
            },
            Err(RetryError::NonRetryable(e)) => {
                tracing::warn!("[CRITAL] non-retryable error on attempt {}: {}", attempt, e);
                return Err(e);
            },
            Err(RetryError::Retryable(e)) => {
                let delay = policy.backoff.delay(attempt);
                if Instant::now() + delay >= deadline {
                    tracing::warn!(
                        "retry deadline of {:?} exhausted after {} attempts: {}",
                        policy.max_duration,
                        attempt,
                        e
                    );
                    return Err(e);
                }

                tracing::debug!("retryable error on attempt {}: {}", attempt, e);
                if delay.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(delay).await;
                }
            },
        }
    }
}

/// Classify an SDK error: retryable when its code is in
/// [`RETRYABLE_ERROR_CODES`] or in `additional`, terminal otherwise
pub fn retry_error(err: SdkError, additional: &[&str]) -> RetryError<SdkError> {
    if err.is_expect_error(RETRYABLE_ERROR_CODES) || err.is_expect_error(additional) {
        tracing::debug!("retryable defined error: {}", err);
        return RetryError::Retryable(err);
    }
    RetryError::NonRetryable(err)
}
