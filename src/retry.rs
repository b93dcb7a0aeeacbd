//! Retry executor
//!
//! Runs a fallible operation until it produces an accepted value, fails permanently, runs out of
//! attempts or time, or is cancelled.
//!
//! Semantics:
//! - `max_attempts` counts total attempts (initial try + retries); `None` means unlimited.
//! - `max_elapsed` bounds the time since the first attempt started; it is checked after each
//!   retryable attempt, before waiting.
//! - The error policy is consulted only for `Err` outcomes, the result policy only for `Ok`
//!   outcomes. Without a result policy every value is accepted.
//! - The delay policy is called once per retry with the number of the attempt that just failed.
//! - Cancellation is checked before every attempt and raced against every wait; it never reaches
//!   the policies.
//!
//! Invariants:
//! - Attempt numbers start at 1 and increase by exactly 1.
//! - The operation is never invoked again before the previous invocation has returned.
//! - A terminal failure carries the last real outcome: the operation's error or the last
//!   rejected value.
//!
//! The async (`execute*`) and blocking (`execute_blocking*`) entry points share the evaluation
//! step and differ only in how the wait is performed.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use steadfast::{Backoff, Jitter, RetryError, RetryPolicy};
//!
//! #[derive(Debug)]
//! struct MyErr;
//! impl std::fmt::Display for MyErr { fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "oops") } }
//! impl std::error::Error for MyErr {}
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::<(), MyErr>::builder()
//!     .max_attempts(3) // total attempts
//!     .backoff(Backoff::exponential(Duration::from_millis(1)).with_jitter(Jitter::full()))
//!     .should_retry(|_e: &MyErr| true)
//!     .build()
//!     .unwrap();
//! let result = policy.execute(|| async { Err(MyErr) }).await;
//! assert!(matches!(result, Err(RetryError::Exhausted { attempts: 3, .. })));
//! # });
//! ```

use crate::backoff::{Backoff, BackoffError};
use crate::clock::{Clock, MonotonicClock};
use crate::delay::DelayPolicy;
use crate::error::{Limit, RetryError};
use crate::jitter::Jitter;
use crate::outcome::{AttemptRecord, Outcome};
use crate::policy::{AnyError, ErrorPolicy, ResultPolicy, RetryIfResult};
use crate::sleeper::{Sleeper, TokioSleeper, Wake};
use crate::telemetry::{LogListener, RetryEvent, RetryListener};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Attempts allowed by a fresh builder.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Retry executor combining error, result and delay policies with attempt/time limits.
pub struct RetryPolicy<T, E> {
    max_attempts: Option<usize>,
    max_elapsed: Option<Duration>,
    error_policy: Arc<dyn ErrorPolicy<E>>,
    result_policy: Option<Arc<dyn ResultPolicy<T>>>,
    delay: Arc<dyn DelayPolicy<T, E>>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn RetryListener>,
}

impl<T, E> Clone for RetryPolicy<T, E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            max_elapsed: self.max_elapsed,
            error_policy: self.error_policy.clone(),
            result_policy: self.result_policy.clone(),
            delay: self.delay.clone(),
            sleeper: self.sleeper.clone(),
            clock: self.clock.clone(),
            listener: self.listener.clone(),
        }
    }
}

impl<T, E> std::fmt::Debug for RetryPolicy<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("max_elapsed", &self.max_elapsed)
            .field("error_policy", &"<predicate>")
            .field("result_policy", &self.result_policy.as_ref().map(|_| "<predicate>"))
            .field("delay", &"<delay>")
            .field("sleeper", &self.sleeper)
            .field("clock", &self.clock)
            .finish()
    }
}

/// What the loop does after an attempt has been evaluated.
enum Step<T, E> {
    Done(Result<T, RetryError<T, E>>),
    Wait(Duration),
}

impl<T, E> RetryPolicy<T, E> {
    /// Construct a new builder with defaults.
    pub fn builder() -> RetryPolicyBuilder<T, E> {
        RetryPolicyBuilder::new()
    }

    pub fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }

    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed
    }

    /// Execute an async operation with retry semantics.
    pub async fn execute<Fut, Op>(&self, operation: Op) -> Result<T, RetryError<T, E>>
    where
        Fut: Future<Output = Result<T, E>>,
        Op: FnMut() -> Fut,
    {
        let never = CancellationToken::new();
        self.run(&never, operation).await
    }

    /// Execute an async operation, stopping as soon as `cancel` fires.
    pub async fn execute_with_cancel<Fut, Op>(
        &self,
        cancel: &CancellationToken,
        operation: Op,
    ) -> Result<T, RetryError<T, E>>
    where
        Fut: Future<Output = Result<T, E>>,
        Op: FnMut() -> Fut,
    {
        self.run(cancel, operation).await
    }

    /// Execute an async operation that takes arguments; every attempt gets a clone of `args`.
    ///
    /// Several positional inputs are passed as a tuple.
    pub async fn execute_with<A, Fut, Op>(
        &self,
        args: A,
        mut operation: Op,
    ) -> Result<T, RetryError<T, E>>
    where
        A: Clone,
        Fut: Future<Output = Result<T, E>>,
        Op: FnMut(A) -> Fut,
    {
        let never = CancellationToken::new();
        self.run(&never, || operation(args.clone())).await
    }

    /// Execute a blocking operation, suspending the current thread between attempts.
    pub fn execute_blocking<Op>(&self, operation: Op) -> Result<T, RetryError<T, E>>
    where
        Op: FnMut() -> Result<T, E>,
    {
        self.run_blocking(&CancellationToken::new(), operation)
    }

    /// Execute a blocking operation, stopping as soon as `cancel` fires.
    pub fn execute_blocking_with_cancel<Op>(
        &self,
        cancel: &CancellationToken,
        operation: Op,
    ) -> Result<T, RetryError<T, E>>
    where
        Op: FnMut() -> Result<T, E>,
    {
        self.run_blocking(cancel, operation)
    }

    async fn run<Fut, Op>(
        &self,
        cancel: &CancellationToken,
        mut operation: Op,
    ) -> Result<T, RetryError<T, E>>
    where
        Fut: Future<Output = Result<T, E>>,
        Op: FnMut() -> Fut,
    {
        let start = self.clock.now_millis();
        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(self.cancelled(attempt - 1, start));
            }
            let outcome = Outcome::from(operation().await);
            let delay = match self.evaluate(self.record(attempt, start), outcome) {
                Step::Done(result) => return result,
                Step::Wait(delay) => delay,
            };
            if cancel.is_cancelled() {
                return Err(self.cancelled(attempt, start));
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(attempt, start)),
                _ = self.sleeper.sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    fn run_blocking<Op>(
        &self,
        cancel: &CancellationToken,
        mut operation: Op,
    ) -> Result<T, RetryError<T, E>>
    where
        Op: FnMut() -> Result<T, E>,
    {
        let start = self.clock.now_millis();
        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(self.cancelled(attempt - 1, start));
            }
            let outcome = Outcome::from(operation());
            let delay = match self.evaluate(self.record(attempt, start), outcome) {
                Step::Done(result) => return result,
                Step::Wait(delay) => delay,
            };
            if self.sleeper.sleep_blocking(delay, cancel) == Wake::Cancelled {
                return Err(self.cancelled(attempt, start));
            }
            attempt += 1;
        }
    }

    fn record(&self, number: usize, start: u64) -> AttemptRecord {
        AttemptRecord { number, elapsed: self.elapsed_since(start) }
    }

    fn elapsed_since(&self, start: u64) -> Duration {
        Duration::from_millis(self.clock.now_millis().saturating_sub(start))
    }

    /// Classify one outcome and decide between a terminal result and another wait.
    fn evaluate(&self, record: AttemptRecord, outcome: Outcome<T, E>) -> Step<T, E> {
        let AttemptRecord { number: attempts, elapsed } = record;
        let retryable = match &outcome {
            Outcome::Failure(error) => self.error_policy.is_transient(error),
            Outcome::Success(value) => match &self.result_policy {
                Some(policy) => !policy.is_acceptable(value),
                None => false,
            },
        };

        if !retryable {
            return Step::Done(match outcome {
                Outcome::Success(value) => {
                    self.listener.on_event(&RetryEvent::Succeeded { attempts, elapsed });
                    Ok(value)
                }
                Outcome::Failure(error) => {
                    self.listener.on_event(&RetryEvent::PermanentFailure { attempts, elapsed });
                    Err(RetryError::Permanent { error, attempts })
                }
            });
        }

        let soft_failure = outcome.is_success();
        if let Some(limit) = self.limit_reached(record) {
            self.listener.on_event(&RetryEvent::Exhausted {
                attempts,
                elapsed,
                limit,
                soft_failure,
            });
            return Step::Done(Err(match outcome {
                Outcome::Failure(error) => RetryError::Exhausted { error, attempts, limit },
                Outcome::Success(value) => RetryError::Rejected { value, attempts, limit },
            }));
        }

        let delay = self.delay.delay(attempts, &outcome);
        self.listener.on_event(&RetryEvent::Retrying {
            attempt: attempts,
            delay,
            elapsed,
            soft_failure,
        });
        Step::Wait(delay)
    }

    fn limit_reached(&self, record: AttemptRecord) -> Option<Limit> {
        if self.max_attempts.is_some_and(|max| record.number >= max) {
            return Some(Limit::MaxAttempts);
        }
        if self.max_elapsed.is_some_and(|max| record.elapsed >= max) {
            return Some(Limit::MaxElapsed);
        }
        None
    }

    fn cancelled(&self, attempts: usize, start: u64) -> RetryError<T, E> {
        let elapsed = self.elapsed_since(start);
        self.listener.on_event(&RetryEvent::Cancelled { attempts, elapsed });
        RetryError::Cancelled { attempts }
    }
}

/// Builder for `RetryPolicy`.
pub struct RetryPolicyBuilder<T, E> {
    max_attempts: Option<usize>,
    max_elapsed: Option<Duration>,
    error_policy: Arc<dyn ErrorPolicy<E>>,
    result_policy: Option<Arc<dyn ResultPolicy<T>>>,
    delay: Arc<dyn DelayPolicy<T, E>>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn RetryListener>,
}

impl<T, E> std::fmt::Debug for RetryPolicyBuilder<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicyBuilder")
            .field("max_attempts", &self.max_attempts)
            .field("max_elapsed", &self.max_elapsed)
            .field("error_policy", &"<predicate>")
            .field("result_policy", &self.result_policy.as_ref().map(|_| "<predicate>"))
            .field("delay", &"<delay>")
            .field("sleeper", &self.sleeper)
            .field("clock", &self.clock)
            .finish()
    }
}

/// Errors produced while building a retry policy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// `max_attempts` must be > 0.
    #[error("max_attempts must be > 0 (got {0})")]
    InvalidMaxAttempts(usize),
    /// `max_elapsed` must be > 0.
    #[error("max_elapsed must be greater than zero")]
    InvalidMaxElapsed,
    /// A signed duration from configuration was negative.
    #[error("{field} must not be negative (got {value})")]
    NegativeDuration { field: &'static str, value: i64 },
    /// Backoff or jitter parameters were rejected.
    #[error(transparent)]
    Backoff(#[from] BackoffError),
}

impl<T, E> RetryPolicyBuilder<T, E> {
    /// Create a builder with sane defaults: 3 attempts, every error transient, every value
    /// accepted, exponential backoff from 1s with full jitter.
    pub fn new() -> Self {
        Self {
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            max_elapsed: None,
            error_policy: Arc::new(AnyError),
            result_policy: None,
            delay: Arc::new(
                Backoff::exponential(Duration::from_secs(1)).with_jitter(Jitter::full()),
            ),
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(MonotonicClock::default()),
            listener: Arc::new(LogListener),
        }
    }

    /// Set total attempts (initial + retries). Must be > 0.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Remove the attempt limit; the execution then ends only on success, a permanent failure,
    /// `max_elapsed`, or cancellation.
    pub fn unlimited_attempts(mut self) -> Self {
        self.max_attempts = None;
        self
    }

    /// Bound the total time since the first attempt started. Must be > 0.
    pub fn max_elapsed(mut self, budget: Duration) -> Self {
        self.max_elapsed = Some(budget);
        self
    }

    /// Set the policy deciding which errors are transient.
    pub fn error_policy<P>(mut self, policy: P) -> Self
    where
        P: ErrorPolicy<E> + 'static,
    {
        self.error_policy = Arc::new(policy);
        self
    }

    /// Predicate to decide if an error is retryable.
    pub fn should_retry<F>(self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.error_policy(predicate)
    }

    /// Set the policy deciding which returned values are acceptable.
    pub fn result_policy<P>(mut self, policy: P) -> Self
    where
        P: ResultPolicy<T> + 'static,
    {
        self.result_policy = Some(Arc::new(policy));
        self
    }

    /// Retry while `predicate` holds for the returned value.
    pub fn retry_if<F>(self, predicate: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.result_policy(RetryIfResult::new().matching(predicate))
    }

    /// Set backoff strategy.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.delay = Arc::new(backoff);
        self
    }

    /// Use a custom delay policy, e.g. one that honors a server-provided retry hint.
    pub fn delay_policy<P>(mut self, policy: P) -> Self
    where
        P: DelayPolicy<T, E> + 'static,
    {
        self.delay = Arc::new(policy);
        self
    }

    /// Provide a custom sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Provide the clock used for the elapsed-time budget.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Receive execution events; defaults to [`LogListener`].
    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: RetryListener + 'static,
    {
        self.listener = Arc::new(listener);
        self
    }

    /// Build the retry policy, validating inputs.
    pub fn build(self) -> Result<RetryPolicy<T, E>, BuildError> {
        if self.max_attempts == Some(0) {
            return Err(BuildError::InvalidMaxAttempts(0));
        }
        if self.max_elapsed.is_some_and(|d| d.is_zero()) {
            return Err(BuildError::InvalidMaxElapsed);
        }
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            max_elapsed: self.max_elapsed,
            error_policy: self.error_policy,
            result_policy: self.result_policy,
            delay: self.delay,
            sleeper: self.sleeper,
            clock: self.clock,
            listener: self.listener,
        })
    }
}

impl<T, E> Default for RetryPolicyBuilder<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleeper::{InstantSleeper, TrackingSleeper};
    use crate::telemetry::MemoryListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestError(String);

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "TestError: {}", self.0)
        }
    }

    impl std::error::Error for TestError {}

    fn quick<T>() -> RetryPolicyBuilder<T, TestError> {
        RetryPolicy::builder()
            .backoff(Backoff::constant(Duration::from_millis(10)))
            .with_sleeper(InstantSleeper)
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let policy = quick().max_attempts(3).build().expect("builder");

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "Should only execute once");
    }

    #[tokio::test]
    async fn test_success_after_retries() {
        let policy = quick().max_attempts(5).build().expect("builder");

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(TestError(format!("attempt {}", attempt)))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3, "Should succeed on 3rd attempt");
    }

    #[tokio::test]
    async fn test_retry_exhaustion_returns_last_error() {
        let policy = quick().max_attempts(3).build().expect("builder");

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(TestError(format!("attempt {}", attempt)))
                }
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 3, "Should attempt 3 times");
        match result.unwrap_err() {
            RetryError::Exhausted { error, attempts, limit } => {
                assert_eq!(attempts, 3);
                assert_eq!(limit, Limit::MaxAttempts);
                assert_eq!(error.0, "attempt 2");
            }
            e => panic!("Expected Exhausted, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_backoff_applied() {
        let sleeper = TrackingSleeper::new();
        let policy = RetryPolicy::builder()
            .max_attempts(4)
            .backoff(Backoff::linear(Duration::from_millis(100)))
            .with_sleeper(sleeper.clone())
            .build()
            .expect("builder");

        let _ = policy.execute(|| async { Err::<(), _>(TestError("always fail".into())) }).await;

        assert_eq!(sleeper.call_count(), 3, "Should sleep 3 times (between 4 attempts)");

        // Linear backoff: 100ms, 200ms, 300ms
        assert_eq!(sleeper.call_at(0).unwrap(), Duration::from_millis(100));
        assert_eq!(sleeper.call_at(1).unwrap(), Duration::from_millis(200));
        assert_eq!(sleeper.call_at(2).unwrap(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_jitter_applied() {
        let sleeper = TrackingSleeper::new();
        let policy = RetryPolicy::builder()
            .max_attempts(3)
            .backoff(Backoff::constant(Duration::from_millis(100)).with_jitter(Jitter::full()))
            .with_sleeper(sleeper.clone())
            .build()
            .expect("builder");

        let _ = policy.execute(|| async { Err::<(), _>(TestError("always fail".into())) }).await;

        assert_eq!(sleeper.call_count(), 2, "Should sleep 2 times (between 3 attempts)");
        for call in sleeper.calls() {
            assert!(call <= Duration::from_millis(100), "Jitter should not exceed base delay");
        }
    }

    #[tokio::test]
    async fn test_should_retry_predicate() {
        let policy = quick()
            .max_attempts(5)
            .should_retry(|e: &TestError| e.0.contains("retryable"))
            .build()
            .expect("builder");

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(TestError("fatal error".to_string()))
                }
            })
            .await;

        assert!(matches!(result, Err(RetryError::Permanent { attempts: 1, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1, "Should not retry non-retryable error");

        counter.store(0, Ordering::SeqCst);

        let result = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(TestError("retryable error".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3, "Should retry retryable error");
    }

    #[tokio::test]
    async fn result_policy_retries_soft_failures() {
        let policy = quick()
            .max_attempts(5)
            .retry_if(|v: &Option<u32>| v.is_none())
            .build()
            .expect("builder");

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(if attempt < 3 { None } else { Some(7) })
                }
            })
            .await;

        assert_eq!(result.unwrap(), Some(7));
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn rejected_value_is_returned_on_exhaustion() {
        let policy = quick().max_attempts(2).retry_if(|v: &i32| *v < 0).build().expect("builder");

        let result = policy.execute(|| async { Ok::<i32, TestError>(-5) }).await;

        assert_eq!(
            result.unwrap_err(),
            RetryError::Rejected { value: -5, attempts: 2, limit: Limit::MaxAttempts }
        );
    }

    #[tokio::test]
    async fn test_max_attempts_config() {
        let policy = quick().max_attempts(1).build().expect("builder");

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute(|| {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(TestError("fail".to_string()))
                }
            })
            .await;

        assert!(result.unwrap_err().is_exhausted());
        assert_eq!(counter.load(Ordering::SeqCst), 1, "Should only attempt once");
    }

    #[tokio::test]
    async fn test_exponential_backoff_without_jitter() {
        let sleeper = TrackingSleeper::new();
        let policy = RetryPolicy::builder()
            .max_attempts(4)
            .backoff(Backoff::exponential(Duration::from_millis(100)))
            .with_sleeper(sleeper.clone())
            .build()
            .expect("builder");

        let _ = policy.execute(|| async { Err::<(), _>(TestError("fail".to_string())) }).await;

        // Exponential: 100ms, 200ms, 400ms
        assert_eq!(
            sleeper.calls(),
            vec![Duration::from_millis(100), Duration::from_millis(200), Duration::from_millis(400)]
        );
    }

    #[tokio::test]
    async fn execute_with_passes_same_args_every_attempt() {
        let policy = quick().max_attempts(3).build().expect("builder");
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let result = policy
            .execute_with((String::from("key"), 9u8), |(key, n)| {
                let seen = seen_clone.clone();
                async move {
                    let mut seen = seen.lock().unwrap();
                    seen.push((key.clone(), n));
                    if seen.len() < 3 {
                        Err(TestError("again".into()))
                    } else {
                        Ok(format!("{}={}", key, n))
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "key=9");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(k, n)| k == "key" && *n == 9));
    }

    #[tokio::test]
    async fn listener_sees_every_transition() {
        let listener = MemoryListener::new();
        let policy = quick::<()>()
            .max_attempts(3)
            .with_listener(listener.clone())
            .build()
            .expect("builder");

        let _ = policy.execute(|| async { Err::<(), _>(TestError("x".into())) }).await;

        let events = listener.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], RetryEvent::Retrying { attempt: 1, soft_failure: false, .. }));
        assert!(matches!(events[1], RetryEvent::Retrying { attempt: 2, .. }));
        assert!(matches!(
            events[2],
            RetryEvent::Exhausted { attempts: 3, limit: Limit::MaxAttempts, .. }
        ));
    }

    #[tokio::test]
    async fn builder_rejects_invalid_limits() {
        let err = RetryPolicy::<(), TestError>::builder().max_attempts(0).build();
        assert!(matches!(err, Err(BuildError::InvalidMaxAttempts(0))));

        let err = RetryPolicy::<(), TestError>::builder().max_elapsed(Duration::ZERO).build();
        assert!(matches!(err, Err(BuildError::InvalidMaxElapsed)));

        let ok = RetryPolicy::<(), TestError>::builder().unlimited_attempts().build().unwrap();
        assert_eq!(ok.max_attempts(), None);
    }

    #[test]
    fn blocking_matches_async_semantics() {
        let sleeper = TrackingSleeper::new();
        let policy = RetryPolicy::builder()
            .max_attempts(4)
            .backoff(Backoff::exponential(Duration::from_millis(10)))
            .with_sleeper(sleeper.clone())
            .build()
            .expect("builder");

        let mut calls = 0;
        let result = policy.execute_blocking(|| {
            calls += 1;
            if calls < 3 {
                Err(TestError("busy".into()))
            } else {
                Ok(calls)
            }
        });

        assert_eq!(result.unwrap(), 3);
        assert_eq!(sleeper.calls(), vec![Duration::from_millis(10), Duration::from_millis(20)]);
    }

    #[test]
    fn builder_debug_lists_limits() {
        let builder = quick::<()>().max_attempts(4).max_elapsed(Duration::from_secs(2));
        let rendered = format!("{builder:?}");
        assert!(rendered.starts_with("RetryPolicyBuilder"));
        assert!(rendered.contains("max_attempts: Some(4)"));
        assert!(rendered.contains("max_elapsed: Some(2s)"));
    }
}
