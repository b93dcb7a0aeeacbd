//! Convenient re-exports for common steadfast types.
pub use crate::{
    backoff::{Backoff, BackoffError, MAX_BACKOFF},
    error::{Limit, RetryError},
    jitter::Jitter,
    policy::{AnyError, ErrorPolicy, ErrorType, NoError, ResultPolicy, RetryIfResult, RetryOn},
    retry::{BuildError, RetryPolicy, RetryPolicyBuilder},
    retry_on, CancellationToken, RetryLayer,
};
