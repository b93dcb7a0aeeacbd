//! Declarative retry configuration.
//!
//! `RetryConfig` is plain data (deserializable with the `serde` feature) that turns into a
//! [`RetryPolicyBuilder`]. Durations are signed milliseconds so that a negative value coming
//! from a file or an environment is reported as [`BuildError::NegativeDuration`] when the
//! builder is created, before any attempt runs.
//!
//! ```rust
//! use steadfast::config::{DelayConfig, DelayStrategy, JitterConfig, RetryConfig};
//! use steadfast::RetryPolicyBuilder;
//!
//! let config = RetryConfig {
//!     max_attempts: Some(5),
//!     max_elapsed_ms: Some(10_000),
//!     delay: DelayConfig {
//!         strategy: DelayStrategy::Exponential,
//!         base_ms: 100,
//!         max_ms: Some(2_000),
//!         factor: None,
//!         jitter: JitterConfig::Full,
//!     },
//! };
//! let policy = RetryPolicyBuilder::<(), std::io::Error>::from_config(&config)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! assert_eq!(policy.max_attempts(), Some(5));
//! ```

use crate::backoff::{Backoff, BackoffError};
use crate::jitter::Jitter;
use crate::retry::{BuildError, RetryPolicyBuilder, DEFAULT_MAX_ATTEMPTS};
use std::time::Duration;

/// Shape of the delay curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DelayStrategy {
    Constant,
    Linear,
    #[default]
    Exponential,
}

/// Randomization applied to each delay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum JitterConfig {
    None,
    #[default]
    Full,
    Equal,
    Proportional { ratio: f64 },
}

impl JitterConfig {
    pub fn to_jitter(self) -> Result<Jitter, BackoffError> {
        match self {
            JitterConfig::None => Ok(Jitter::None),
            JitterConfig::Full => Ok(Jitter::full()),
            JitterConfig::Equal => Ok(Jitter::equal()),
            JitterConfig::Proportional { ratio } => Jitter::proportional(ratio),
        }
    }
}

/// Delay policy parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct DelayConfig {
    pub strategy: DelayStrategy,
    /// Constant delay, linear step, or first exponential delay.
    pub base_ms: i64,
    /// Cap for linear and exponential delays.
    pub max_ms: Option<i64>,
    /// Exponential growth factor; defaults to 2.
    pub factor: Option<f64>,
    pub jitter: JitterConfig,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            strategy: DelayStrategy::Exponential,
            base_ms: 1_000,
            max_ms: None,
            factor: None,
            jitter: JitterConfig::Full,
        }
    }
}

impl DelayConfig {
    /// Validate and convert into a [`Backoff`].
    pub fn to_backoff(&self) -> Result<Backoff, BuildError> {
        let base = non_negative("delay.base_ms", self.base_ms)?;
        let mut backoff = match self.strategy {
            DelayStrategy::Constant => Backoff::constant(base),
            DelayStrategy::Linear => Backoff::linear(base),
            DelayStrategy::Exponential => Backoff::exponential(base),
        };
        if let Some(max_ms) = self.max_ms {
            backoff = backoff.with_max(non_negative("delay.max_ms", max_ms)?)?;
        }
        if let Some(factor) = self.factor {
            backoff = backoff.with_factor(factor)?;
        }
        Ok(backoff.with_jitter(self.jitter.to_jitter()?))
    }
}

/// Complete retry configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct RetryConfig {
    /// Total attempts; `None` (or `null`) means unlimited.
    pub max_attempts: Option<usize>,
    /// Budget measured from the start of the first attempt.
    pub max_elapsed_ms: Option<i64>,
    pub delay: DelayConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            max_elapsed_ms: None,
            delay: DelayConfig::default(),
        }
    }
}

impl<T, E> RetryPolicyBuilder<T, E> {
    /// Start a builder from configuration. Policies, sleeper, clock and listener keep their
    /// defaults and can be set afterwards.
    pub fn from_config(config: &RetryConfig) -> Result<Self, BuildError> {
        let mut builder = Self::new().backoff(config.delay.to_backoff()?);
        builder = match config.max_attempts {
            Some(attempts) => builder.max_attempts(attempts),
            None => builder.unlimited_attempts(),
        };
        if let Some(ms) = config.max_elapsed_ms {
            builder = builder.max_elapsed(non_negative("max_elapsed_ms", ms)?);
        }
        Ok(builder)
    }
}

fn non_negative(field: &'static str, ms: i64) -> Result<Duration, BuildError> {
    u64::try_from(ms)
        .map(Duration::from_millis)
        .map_err(|_| BuildError::NegativeDuration { field, value: ms })
}
