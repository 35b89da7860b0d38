//! Retry helper for Dashboard API calls.
//!
//! The Dashboard API answers with spurious 4xx responses while it is still
//! settling a recent write (e.g. ID collisions when resources are created in
//! quick succession). [`with_retry`] re-issues a call on 4xx only, a bounded
//! number of times, waiting a fixed delay before each retry and giving up
//! early when the caller's [`Cancellation`] fires.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::http::ApiError;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// How often, and how far apart, a failed call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Upper bound on retries; total attempts are at most `max_retries + 1`.
    pub max_retries: u32,
    /// Wait inserted before each retry. The first attempt is not delayed.
    pub delay: Duration,
}

impl RetryConfig {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        )
    }
}

/// Fires every paired [`Cancellation`].
#[derive(Debug)]
pub struct CancelHandle {
    signal: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.signal.send_replace(true);
    }
}

/// Cooperative cancellation observed by [`with_retry`] between attempts.
///
/// Fires when the paired [`CancelHandle`] is cancelled or when the optional
/// deadline passes, whichever comes first. Clones observe the same signal.
#[derive(Debug, Clone)]
pub struct Cancellation {
    signal: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

/// Creates a connected handle / cancellation pair.
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle { signal: tx },
        Cancellation {
            signal: rx,
            deadline: None,
        },
    )
}

impl Cancellation {
    /// A cancellation that never fires.
    pub fn never() -> Self {
        let (_handle, cancellation) = cancellation();
        cancellation
    }

    /// Also fire at `deadline`. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Also fire once `timeout` has elapsed from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once cancelled. Pends forever if the handle is dropped
    /// without cancelling and there is no deadline.
    pub async fn cancelled(&self) {
        let mut signal = self.signal.clone();
        let fired = async move {
            let result = signal.wait_for(|cancelled| *cancelled).await.map(|_| ());
            if result.is_err() {
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = fired => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => fired.await,
        }
    }
}

/// Runs `operation`, retrying it while it fails with a retryable status.
///
/// Returns the first success, or the last error unchanged once the error is
/// not retryable or `config.max_retries` retries have been spent. If
/// `cancel` fires while waiting between attempts, returns
/// [`ApiError::Cancelled`] without issuing another call. The operation is
/// only ever borrowed, so whatever it captures is left untouched.
pub async fn with_retry<T, F, Fut>(
    cancel: &Cancellation,
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = config.max_retries.saturating_add(1);
    let mut retries: u32 = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() {
            debug!("{}: non-retryable error: {}", operation_name, err);
            return Err(err);
        }

        if retries >= config.max_retries {
            warn!(
                "{}: giving up after {} attempt(s): {}",
                operation_name,
                retries.saturating_add(1),
                err
            );
            return Err(err);
        }

        retries += 1;
        warn!(
            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
            operation_name,
            retries,
            max_attempts,
            err,
            config.delay.as_millis()
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("{}: cancelled while waiting to retry", operation_name);
                return Err(ApiError::Cancelled);
            }
            _ = tokio::time::sleep(config.delay) => {}
        }
    }
}
