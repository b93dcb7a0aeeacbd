//! Result classification: is a returned value good enough, or a soft failure?

use std::fmt;
use std::sync::Arc;

/// Decides whether a successfully returned value is acceptable.
///
/// `true` accepts the value and ends the execution; `false` marks it as a soft failure that is
/// retried like a transient error.
pub trait ResultPolicy<T>: Send + Sync {
    fn is_acceptable(&self, value: &T) -> bool;
}

impl<T, F> ResultPolicy<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_acceptable(&self, value: &T) -> bool {
        self(value)
    }
}

type SoftFailure<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Result policy built from soft-failure predicates; a value is acceptable iff none match.
///
/// ```rust
/// use steadfast::{ResultPolicy, RetryIfResult};
///
/// let policy = RetryIfResult::new().equals(-1).matching(|v: &i32| *v > 100);
/// assert!(policy.is_acceptable(&7));
/// assert!(!policy.is_acceptable(&-1));
/// assert!(!policy.is_acceptable(&101));
/// ```
pub struct RetryIfResult<T> {
    predicates: Vec<SoftFailure<T>>,
}

impl<T> RetryIfResult<T>
where
    T: 'static,
{
    pub fn new() -> Self {
        Self { predicates: Vec::new() }
    }

    /// Retry while the value equals `sentinel`.
    pub fn equals(self, sentinel: T) -> Self
    where
        T: PartialEq + Send + Sync,
    {
        self.matching(move |v: &T| *v == sentinel)
    }

    /// Retry while `predicate` holds for the value.
    pub fn matching<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Arc::new(predicate));
        self
    }
}

impl<T> RetryIfResult<T> {
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl<T> Clone for RetryIfResult<T> {
    fn clone(&self) -> Self {
        Self { predicates: self.predicates.clone() }
    }
}

impl<T: 'static> Default for RetryIfResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RetryIfResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryIfResult").field("predicates", &self.predicates.len()).finish()
    }
}

impl<T> ResultPolicy<T> for RetryIfResult<T> {
    fn is_acceptable(&self, value: &T) -> bool {
        !self.predicates.iter().any(|p| p(value))
    }
}
