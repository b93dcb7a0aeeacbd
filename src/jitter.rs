//! Jitter strategies to prevent thundering herd
//!
//! When to use which strategy:
//! - `None`: deterministic retries for tests or tightly controlled workflows.
//! - `Full`: uniform in `[0, delay]`, good default to spread load.
//! - `Equal`: uniform in `[delay/2, delay]`, keeps a floor while adding randomness.
//! - `Proportional`: uniform in `[delay * (1 - ratio), delay * (1 + ratio)]`, bounded spread
//!   around the computed delay.
//!
//! Notes:
//! - RNG: uses `rand`'s thread-local RNG by default; deterministic RNGs can be injected via
//!   `apply_with_rng`.
//! - Precision: randomization works in nanoseconds, saturating to `u64::MAX` nanoseconds
//!   (about 584 years) to avoid panics on very large durations.
//! - Jitter carries no state between calls, so one value can be shared by any number of
//!   concurrent executions.
//!
//! Example:
//! ```rust
//! use steadfast::{Backoff, Jitter};
//! use std::time::Duration;
//!
//! let backoff = Backoff::exponential(Duration::from_millis(100)).with_jitter(Jitter::full());
//! assert!(backoff.delay(1) <= Duration::from_millis(100));
//! ```

use crate::backoff::BackoffError;
use rand::{rng, Rng};
use std::time::Duration;

/// Jitter strategy for randomizing retry delays
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Jitter {
    /// No jitter - use exact backoff delay
    #[default]
    None,
    /// Full jitter: random between 0 and delay
    Full,
    /// Equal jitter: random between delay/2 and delay
    Equal,
    /// Random within `ratio` of the delay on either side; `ratio` is in `[0, 1]`
    Proportional { ratio: f64 },
}

impl Jitter {
    /// Create a full jitter strategy
    pub fn full() -> Self {
        Jitter::Full
    }

    /// Create an equal jitter strategy
    pub fn equal() -> Self {
        Jitter::Equal
    }

    /// Create a proportional jitter strategy. `ratio` must be finite and within `[0, 1]`.
    pub fn proportional(ratio: f64) -> Result<Self, BackoffError> {
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(BackoffError::InvalidJitterRatio(ratio));
        }
        Ok(Jitter::Proportional { ratio })
    }

    /// Apply jitter to a delay duration
    pub fn apply(&self, delay: Duration) -> Duration {
        let mut rng = rng();
        self.apply_internal(delay, &mut rng)
    }

    /// Apply jitter with a custom RNG (for testing)
    pub fn apply_with_rng<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        self.apply_internal(delay, rng)
    }

    fn as_nanos_saturated(duration: Duration) -> u64 {
        duration.as_nanos().try_into().unwrap_or(u64::MAX) // Saturate extremely large durations
    }

    fn apply_internal<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Full => {
                let nanos = Self::as_nanos_saturated(delay);
                if nanos == 0 {
                    return Duration::ZERO;
                }
                Duration::from_nanos(rng.random_range(0..=nanos))
            }
            Jitter::Equal => {
                let nanos = Self::as_nanos_saturated(delay);
                if nanos == 0 {
                    return Duration::ZERO;
                }
                let half = nanos / 2;
                Duration::from_nanos(rng.random_range(half..=nanos))
            }
            Jitter::Proportional { ratio } => {
                let nanos = Self::as_nanos_saturated(delay);
                let spread = ((nanos as f64) * ratio.clamp(0.0, 1.0)) as u64;
                if nanos == 0 || spread == 0 {
                    return delay;
                }
                let lower = nanos.saturating_sub(spread);
                let upper = nanos.saturating_add(spread);
                Duration::from_nanos(rng.random_range(lower..=upper))
            }
        }
    }
}
