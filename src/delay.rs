//! Delay policy: how long to wait before the next attempt.

use crate::backoff::Backoff;
use crate::outcome::Outcome;
use std::time::Duration;

/// Computes the wait after a retryable attempt.
///
/// `attempt` is the 1-based number of the attempt that just failed and `outcome` is what it
/// produced. Implementations must be pure apart from deliberate jitter.
pub trait DelayPolicy<T, E>: Send + Sync {
    fn delay(&self, attempt: usize, outcome: &Outcome<T, E>) -> Duration;
}

impl<T, E> DelayPolicy<T, E> for Backoff {
    fn delay(&self, attempt: usize, _outcome: &Outcome<T, E>) -> Duration {
        Backoff::delay(self, attempt)
    }
}

impl<T, E, F> DelayPolicy<T, E> for F
where
    F: Fn(usize, &Outcome<T, E>) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: usize, outcome: &Outcome<T, E>) -> Duration {
        self(attempt, outcome)
    }
}
