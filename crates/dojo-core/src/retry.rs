//! Bounded retry with exponential backoff for fallible async operations.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::{Error, Result};

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_DELAY_MS: u64 = 100;
const DEFAULT_MAX_DELAY_MS: u64 = 2_000;
const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

const FATAL_MARKERS: [&str; 5] = [
    "permission",
    "unauthenticated",
    "unauthorized",
    "forbidden",
    "invalid",
];
const RETRYABLE_MARKERS: [&str; 6] = [
    "network",
    "timeout",
    "timed out",
    "unavailable",
    "deadline",
    "connection refused",
];

/// Retry decision for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Fatal,
}

/// Immutable retry configuration, shared freely between call sites.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    pub classify: fn(&Error) -> RetryClass,
}

impl RetryPolicy {
    pub fn new(
        attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
    ) -> Self {
        Self {
            attempts,
            initial_delay,
            max_delay,
            backoff_factor,
            classify: default_classify,
        }
    }

    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classify: fn(&Error) -> RetryClass) -> Self {
        self.classify = classify;
        self
    }

    /// Delay that follows `current`, capped at `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let scaled = current.as_secs_f64() * self.backoff_factor;
        if !scaled.is_finite() || scaled < 0.0 {
            return self.max_delay;
        }
        Duration::try_from_secs_f64(scaled)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_ATTEMPTS,
            Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            DEFAULT_BACKOFF_FACTOR,
        )
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RetryPolicy")
            .field("attempts", &self.attempts)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_factor", &self.backoff_factor)
            .finish_non_exhaustive()
    }
}

/// Run `operation` until it succeeds, fails fatally, or runs out of attempts.
///
/// Waits `initial_delay` before the first retry and grows the delay by
/// `backoff_factor` up to `max_delay`. No wait follows the final attempt.
pub async fn execute<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let class = (policy.classify)(&error);
        if class == RetryClass::Fatal || attempt >= attempts {
            return Err(error);
        }

        tracing::debug!(
            "Retry attempt {}/{} in {:?} after error: {}",
            attempt + 1,
            attempts,
            delay,
            error
        );
        sleep(delay).await;
        delay = policy.next_delay(delay);
        attempt += 1;
    }
}

/// Classify an error for the default retry policy.
///
/// Unknown failures are fatal so that nothing is retried blindly.
pub fn default_classify(error: &Error) -> RetryClass {
    match error {
        Error::Network(_) => RetryClass::Retryable,
        Error::Http(inner) if inner.is_timeout() || inner.is_connect() => RetryClass::Retryable,
        Error::Io(inner)
            if matches!(
                inner.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
            ) =>
        {
            RetryClass::Retryable
        }
        Error::Unauthorized(_)
        | Error::Validation(_)
        | Error::Ownership { .. }
        | Error::Storage(_)
        | Error::Database(_)
        | Error::NotFound(_)
        | Error::InvalidInput(_)
        | Error::Serialization(_)
        | Error::Config(_) => RetryClass::Fatal,
        other => classify_message(&other.to_string()),
    }
}

/// Keyword classification for errors that only carry a message.
pub fn classify_message(message: &str) -> RetryClass {
    let message = message.to_ascii_lowercase();
    if FATAL_MARKERS.iter().any(|marker| message.contains(marker)) {
        return RetryClass::Fatal;
    }
    if RETRYABLE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
    {
        return RetryClass::Retryable;
    }
    RetryClass::Fatal
}
