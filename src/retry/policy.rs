//! Bounded retry with exponential backoff

use super::observer::{RetryEvent, RetryObserver};
use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; at most `max_retries + 1` attempts run
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_backoff: Duration,
    /// Ceiling on the exponential term
    pub max_backoff: Duration,
    /// Add `U[0, base_backoff)` to every delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            jitter: true,
        }
    }
}

/// A successful result and the number of attempts it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

impl<T> Retried<T> {
    /// Attempts beyond the first
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

impl RetryPolicy {
    /// Create a policy with jitter enabled
    pub fn new(max_retries: u32, base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
            max_backoff,
            jitter: true,
        }
    }

    /// Disable jitter, making delays deterministic
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// `min(base * 2^attempt, max_backoff)`
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_backoff.checked_mul(factor))
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    /// Delay before retry number `attempt` (0-based) after `error`
    ///
    /// A server `Retry-After` hint, capped at `max_backoff`, raises the delay.
    /// The jitter term is kept on top of a capped hint.
    pub fn delay_for(&self, attempt: u32, error: &Error) -> Duration {
        let jitter = self.jitter_term();
        let delay = self.backoff_ceiling(attempt) + jitter;

        match error.retry_after() {
            Some(hint) => delay.max(hint.min(self.max_backoff) + jitter),
            None => delay,
        }
    }

    fn jitter_term(&self) -> Duration {
        if !self.jitter {
            return Duration::ZERO;
        }
        let base_micros = u64::try_from(self.base_backoff.as_micros()).unwrap_or(u64::MAX);
        if base_micros == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::thread_rng().gen_range(0..base_micros))
    }

    /// Run `op` until it succeeds, fails fatally, runs out of retries or is cancelled
    ///
    /// Only errors for which [`Error::is_retryable`] holds are retried. Fatal
    /// errors are returned unchanged. Exhaustion yields
    /// [`Error::RetriesExhausted`] and cancellation yields [`Error::Cancelled`],
    /// both during an attempt and during a backoff sleep.
    pub async fn run<T, F, Fut>(
        &self,
        label: &str,
        mut op: F,
        cancel: &CancellationToken,
        observer: &dyn RetryObserver,
    ) -> Result<Retried<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = op() => outcome,
            };
            let attempts = attempt + 1;

            let error = match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        observer.on_event(label, &RetryEvent::Recovered { attempts });
                    }
                    return Ok(Retried { value, attempts });
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if attempt >= self.max_retries {
                observer.on_event(
                    label,
                    &RetryEvent::GaveUp {
                        attempts,
                        error: error.to_string(),
                    },
                );
                return Err(Error::RetriesExhausted {
                    attempts,
                    last_error: Box::new(error),
                });
            }

            let delay = self.delay_for(attempt, &error);
            observer.on_event(
                label,
                &RetryEvent::Retrying {
                    attempt: attempts,
                    delay,
                    error: error.to_string(),
                },
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}
