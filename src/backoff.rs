//! Backoff strategies for retry policies.
//!
//! Provides constant, linear, and exponential strategies with optional caps, an exponential
//! growth factor, and optional jitter. Attempt semantics: attempt index `0` represents the
//! initial call (no delay); the delay computed after attempt `n` fails uses `attempt = n`.
//! Delays saturate at a documented maximum to avoid overflow.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use steadfast::Backoff;
//!
//! let backoff = Backoff::exponential(Duration::from_millis(100))
//!     .with_max(Duration::from_secs(2))
//!     .unwrap();
//! assert_eq!(backoff.delay(0), Duration::from_millis(0)); // initial call
//! assert_eq!(backoff.delay(1), Duration::from_millis(100));
//! assert_eq!(backoff.delay(2), Duration::from_millis(200));
//! assert_eq!(backoff.delay(6), Duration::from_secs(2)); // capped
//! ```
//!
//! Overflow behavior: computations that would overflow saturate to `MAX_BACKOFF` (1 day).

use crate::jitter::Jitter;
use std::time::Duration;

/// Maximum delay used when calculations overflow (1 day).
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Growth factor used by `Backoff::exponential` unless overridden.
pub const DEFAULT_FACTOR: f64 = 2.0;

/// Errors returned by backoff and jitter configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackoffError {
    #[error("with_max is only valid for Linear or Exponential backoff")]
    ConstantDoesNotSupportMax,
    #[error("max must be greater than zero")]
    MaxMustBePositive,
    #[error("max ({max:?}) must be >= base ({base:?})")]
    MaxLessThanBase { base: Duration, max: Duration },
    #[error("with_factor is only valid for Exponential backoff")]
    FactorRequiresExponential,
    #[error("growth factor must be finite and >= 1.0 (got {0})")]
    InvalidFactor(f64),
    #[error("jitter ratio must be within [0, 1] (got {0})")]
    InvalidJitterRatio(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum BackoffKind {
    Constant { delay: Duration },
    Linear { base: Duration, max: Option<Duration> },
    Exponential { base: Duration, factor: f64, max: Option<Duration> },
}

impl BackoffKind {
    fn delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }
        match self {
            BackoffKind::Constant { delay } => (*delay).min(MAX_BACKOFF),
            BackoffKind::Linear { base, max } => {
                // clamp to prevent truncation/overflow
                let attempt_u32 = attempt.min(u32::MAX as usize) as u32;
                let linear = base.checked_mul(attempt_u32).unwrap_or(MAX_BACKOFF);
                Self::cap(linear, *max)
            }
            BackoffKind::Exponential { base, factor, max } => {
                if base.is_zero() {
                    return Duration::ZERO;
                }
                let exponent = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
                let nanos = base.as_nanos() as f64 * factor.powi(exponent);
                let exp_delay = if !nanos.is_finite() || nanos >= MAX_BACKOFF.as_nanos() as f64 {
                    MAX_BACKOFF
                } else {
                    Duration::from_nanos(nanos.round() as u64)
                };
                Self::cap(exp_delay, *max)
            }
        }
    }

    /// Largest delay this strategy may produce, jitter included.
    fn ceiling(&self) -> Duration {
        match self {
            BackoffKind::Constant { .. } => MAX_BACKOFF,
            BackoffKind::Linear { max, .. } | BackoffKind::Exponential { max, .. } => {
                max.unwrap_or(MAX_BACKOFF).min(MAX_BACKOFF)
            }
        }
    }

    fn cap(delay: Duration, max: Option<Duration>) -> Duration {
        let capped = max.map(|m| delay.min(m)).unwrap_or(delay);
        capped.min(MAX_BACKOFF)
    }
}

/// Delay policy computing the wait before each retry.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    kind: BackoffKind,
    jitter: Jitter,
}

impl Backoff {
    /// Create a constant backoff strategy
    pub fn constant(delay: Duration) -> Self {
        Self { kind: BackoffKind::Constant { delay }, jitter: Jitter::None }
    }

    /// Create a linear backoff strategy: `base * attempt`
    pub fn linear(base: Duration) -> Self {
        Self { kind: BackoffKind::Linear { base, max: None }, jitter: Jitter::None }
    }

    /// Create an exponential backoff strategy: `base * 2^(attempt - 1)`
    pub fn exponential(base: Duration) -> Self {
        Self {
            kind: BackoffKind::Exponential { base, factor: DEFAULT_FACTOR, max: None },
            jitter: Jitter::None,
        }
    }

    /// Set a maximum delay for the backoff (linear or exponential).
    /// Returns an error if called on `Constant`, if `max` is zero, or if `max < base`.
    pub fn with_max(mut self, max: Duration) -> Result<Self, BackoffError> {
        if max.is_zero() {
            return Err(BackoffError::MaxMustBePositive);
        }
        match &mut self.kind {
            BackoffKind::Exponential { max: existing, base, .. }
            | BackoffKind::Linear { max: existing, base } => {
                if max < *base {
                    return Err(BackoffError::MaxLessThanBase { base: *base, max });
                }
                *existing = Some(max);
                Ok(self)
            }
            BackoffKind::Constant { .. } => Err(BackoffError::ConstantDoesNotSupportMax),
        }
    }

    /// Replace the growth factor of an exponential backoff. Must be finite and `>= 1.0`.
    pub fn with_factor(mut self, factor: f64) -> Result<Self, BackoffError> {
        if !factor.is_finite() || factor < 1.0 {
            return Err(BackoffError::InvalidFactor(factor));
        }
        match &mut self.kind {
            BackoffKind::Exponential { factor: existing, .. } => {
                *existing = factor;
                Ok(self)
            }
            _ => Err(BackoffError::FactorRequiresExponential),
        }
    }

    /// Randomize each computed delay. Jitter is applied after the cap, and the jittered value
    /// is clamped to the cap again.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Deterministic delay for `attempt`, before jitter.
    pub fn base_delay(&self, attempt: usize) -> Duration {
        self.kind.delay(attempt)
    }

    /// Delay for a given attempt number (0 = initial call, no delay), with jitter applied.
    pub fn delay(&self, attempt: usize) -> Duration {
        self.jitter.apply(self.kind.delay(attempt)).min(self.kind.ceiling())
    }
}
