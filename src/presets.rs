//! Ready-to-use retry recipes.
//!
//! Each function returns a [`RetryPolicyBuilder`] with pragmatic defaults; policies, sleeper,
//! clock and listener can still be customized before `build()`.
//!
//! ```rust
//! use steadfast::presets;
//!
//! let policy = presets::fast::<u32, std::io::Error>().unwrap().build().unwrap();
//! assert_eq!(policy.max_attempts(), Some(3));
//! ```
//!
//! ## Available Presets
//!
//! - [`fast`]: interactive calls (3 attempts, 50ms exponential, capped at 1s, full jitter)
//! - [`patient`]: background work against a recovering dependency (8 attempts, 500ms
//!   exponential, capped at 30s, equal jitter, 2 minute budget)
//! - [`polling`]: wait for a condition (constant interval, unlimited attempts)

use crate::backoff::Backoff;
use crate::jitter::Jitter;
use crate::retry::{BuildError, RetryPolicyBuilder};
use std::time::Duration;

const FAST_ATTEMPTS: usize = 3;
const FAST_BASE_MILLIS: u64 = 50;
const FAST_MAX_SECS: u64 = 1;

const PATIENT_ATTEMPTS: usize = 8;
const PATIENT_BASE_MILLIS: u64 = 500;
const PATIENT_MAX_SECS: u64 = 30;
const PATIENT_BUDGET_SECS: u64 = 120;

/// Short retries for latency-sensitive calls.
pub fn fast<T, E>() -> Result<RetryPolicyBuilder<T, E>, BuildError> {
    let backoff = Backoff::exponential(Duration::from_millis(FAST_BASE_MILLIS))
        .with_max(Duration::from_secs(FAST_MAX_SECS))?
        .with_jitter(Jitter::full());
    Ok(RetryPolicyBuilder::new().max_attempts(FAST_ATTEMPTS).backoff(backoff))
}

/// Long, spread-out retries bounded by both attempts and total time.
pub fn patient<T, E>() -> Result<RetryPolicyBuilder<T, E>, BuildError> {
    let backoff = Backoff::exponential(Duration::from_millis(PATIENT_BASE_MILLIS))
        .with_max(Duration::from_secs(PATIENT_MAX_SECS))?
        .with_jitter(Jitter::equal());
    Ok(RetryPolicyBuilder::new()
        .max_attempts(PATIENT_ATTEMPTS)
        .max_elapsed(Duration::from_secs(PATIENT_BUDGET_SECS))
        .backoff(backoff))
}

/// Fixed-interval polling without an attempt limit; bound it with `max_elapsed` or
/// cancellation. Usually combined with `retry_if` on the polled value.
pub fn polling<T, E>(interval: Duration) -> RetryPolicyBuilder<T, E> {
    RetryPolicyBuilder::new().unlimited_attempts().backoff(Backoff::constant(interval))
}
