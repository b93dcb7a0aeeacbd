//! Observability hook for retry executions.
//!
//! The executor reports every transition of an execution to a [`RetryListener`]. The listener is
//! the only place transient failures become visible; the executor itself never logs.
//!
//! # Listeners
//!
//! - [`LogListener`] (default): structured `tracing` events.
//! - [`MemoryListener`]: keeps events in memory, for tests and debugging.
//! - [`NullListener`]: discards everything.
//! - any `Fn(&RetryEvent) + Send + Sync` closure.
//!
//! ```rust
//! use steadfast::telemetry::{MemoryListener, RetryEvent, RetryListener};
//! use std::time::Duration;
//!
//! let listener = MemoryListener::new();
//! listener.on_event(&RetryEvent::Succeeded { attempts: 1, elapsed: Duration::ZERO });
//! assert_eq!(listener.len(), 1);
//! ```

use crate::error::Limit;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Events emitted during one retry execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    /// A retryable attempt failed; the executor is about to wait `delay`.
    Retrying {
        /// The attempt that just failed (1-indexed)
        attempt: usize,
        /// The wait before the next attempt
        delay: Duration,
        /// Time since the first attempt started
        elapsed: Duration,
        /// `true` when the attempt returned a value rejected by the result policy
        soft_failure: bool,
    },
    /// An attempt produced an accepted value.
    Succeeded { attempts: usize, elapsed: Duration },
    /// The error policy classified an error as permanent.
    PermanentFailure { attempts: usize, elapsed: Duration },
    /// A limit was reached while outcomes were still retryable.
    Exhausted { attempts: usize, elapsed: Duration, limit: Limit, soft_failure: bool },
    /// The cancellation signal was observed.
    Cancelled { attempts: usize, elapsed: Duration },
}

impl fmt::Display for RetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryEvent::Retrying { attempt, delay, soft_failure, .. } => {
                let kind = if *soft_failure { "rejected result" } else { "transient error" };
                write!(f, "Retry::Retrying(attempt={}, {}, delay={:?})", attempt, kind, delay)
            }
            RetryEvent::Succeeded { attempts, elapsed } => {
                write!(f, "Retry::Succeeded(attempts={}, elapsed={:?})", attempts, elapsed)
            }
            RetryEvent::PermanentFailure { attempts, elapsed } => {
                write!(f, "Retry::PermanentFailure(attempts={}, elapsed={:?})", attempts, elapsed)
            }
            RetryEvent::Exhausted { attempts, elapsed, limit, .. } => write!(
                f,
                "Retry::Exhausted(attempts={}, elapsed={:?}, limit={})",
                attempts, elapsed, limit
            ),
            RetryEvent::Cancelled { attempts, elapsed } => {
                write!(f, "Retry::Cancelled(attempts={}, elapsed={:?})", attempts, elapsed)
            }
        }
    }
}

/// Consumer of [`RetryEvent`]s. Called inline on the execution's own task/thread, so
/// implementations must be quick and must not block.
pub trait RetryListener: Send + Sync {
    fn on_event(&self, event: &RetryEvent);
}

impl<F> RetryListener for F
where
    F: Fn(&RetryEvent) + Send + Sync,
{
    fn on_event(&self, event: &RetryEvent) {
        self(event)
    }
}

/// A listener that discards all events.
#[derive(Clone, Debug, Default)]
pub struct NullListener;

impl RetryListener for NullListener {
    fn on_event(&self, _event: &RetryEvent) {}
}

/// A listener that logs events using the `tracing` crate.
///
/// Retries and successes are logged at DEBUG, permanent failures and cancellation at INFO, and
/// exhaustion at WARN.
#[derive(Clone, Debug, Default)]
pub struct LogListener;

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl RetryListener for LogListener {
    fn on_event(&self, event: &RetryEvent) {
        match event {
            RetryEvent::Retrying { attempt, delay, elapsed, soft_failure } => tracing::debug!(
                attempt,
                delay_ms = millis(*delay),
                elapsed_ms = millis(*elapsed),
                soft_failure,
                "retrying after failed attempt"
            ),
            RetryEvent::Succeeded { attempts, elapsed } => tracing::debug!(
                attempts,
                elapsed_ms = millis(*elapsed),
                "operation succeeded"
            ),
            RetryEvent::PermanentFailure { attempts, elapsed } => tracing::info!(
                attempts,
                elapsed_ms = millis(*elapsed),
                "permanent failure, not retrying"
            ),
            RetryEvent::Exhausted { attempts, elapsed, limit, soft_failure } => tracing::warn!(
                attempts,
                elapsed_ms = millis(*elapsed),
                limit = %limit,
                soft_failure,
                "retries exhausted"
            ),
            RetryEvent::Cancelled { attempts, elapsed } => tracing::info!(
                attempts,
                elapsed_ms = millis(*elapsed),
                "retry cancelled"
            ),
        }
    }
}

/// A listener that stores events in memory; clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemoryListener {
    events: Arc<Mutex<Vec<RetryEvent>>>,
}

impl MemoryListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RetryEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of `Retrying` events seen so far.
    pub fn retries(&self) -> usize {
        self.lock().iter().filter(|e| matches!(e, RetryEvent::Retrying { .. })).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RetryEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RetryListener for MemoryListener {
    fn on_event(&self, event: &RetryEvent) {
        self.lock().push(event.clone());
    }
}
