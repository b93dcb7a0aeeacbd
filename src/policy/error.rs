//! Error classification: is a failed attempt worth retrying?
//!
//! `RetryOn` is an ordered list of [`ErrorType`] discriminators combined with logical OR. Rust
//! has no inheritance, so "the error is `T` or a subtype of `T`" is expressed with the three
//! discriminator shapes:
//!
//! - [`ErrorType::of`]: the error is exactly `T`;
//! - [`ErrorType::matching`]: the error is `T` and a refinement predicate holds (an enum variant,
//!   an `io::ErrorKind`, ...);
//! - [`ErrorType::caused_by`]: `T` appears anywhere in the `source()` chain.
//!
//! ```rust
//! use std::{fmt, io, num::ParseIntError};
//! use steadfast::{retry_on, ErrorPolicy};
//!
//! let policy = retry_on!(io::Error, ParseIntError);
//! let io_err = io::Error::new(io::ErrorKind::TimedOut, "slow");
//! assert!(policy.is_transient(&io_err));
//! assert!(!policy.is_transient(&fmt::Error));
//! ```

use super::PolicyError;
use std::any::type_name;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Decides whether an error is transient (retry) or permanent (stop).
pub trait ErrorPolicy<E>: Send + Sync {
    fn is_transient(&self, error: &E) -> bool;
}

impl<E, F> ErrorPolicy<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn is_transient(&self, error: &E) -> bool {
        self(error)
    }
}

/// Every error is transient.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyError;

impl<E> ErrorPolicy<E> for AnyError {
    fn is_transient(&self, _error: &E) -> bool {
        true
    }
}

/// No error is transient; only soft failures from a result policy are retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoError;

impl<E> ErrorPolicy<E> for NoError {
    fn is_transient(&self, _error: &E) -> bool {
        false
    }
}

type Matcher = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Runtime discriminator over `dyn Error`.
#[derive(Clone)]
pub struct ErrorType {
    name: &'static str,
    matcher: Matcher,
}

impl ErrorType {
    /// Matches errors whose concrete type is `T`.
    pub fn of<T>() -> Self
    where
        T: Error + 'static,
    {
        Self { name: type_name::<T>(), matcher: Arc::new(|e: &(dyn Error + 'static)| e.is::<T>()) }
    }

    /// Matches errors of type `T` for which `predicate` holds.
    pub fn matching<T, F>(predicate: F) -> Self
    where
        T: Error + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            name: type_name::<T>(),
            matcher: Arc::new(move |e: &(dyn Error + 'static)| {
                e.downcast_ref::<T>().is_some_and(&predicate)
            }),
        }
    }

    /// Matches errors that are `T` or have `T` somewhere in their source chain.
    pub fn caused_by<T>() -> Self
    where
        T: Error + 'static,
    {
        Self {
            name: type_name::<T>(),
            matcher: Arc::new(|e: &(dyn Error + 'static)| {
                std::iter::successors(Some(e), |&e| e.source()).any(|e| e.is::<T>())
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, error: &(dyn Error + 'static)) -> bool {
        (self.matcher)(error)
    }
}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorType").field(&self.name).finish()
    }
}

/// Error policy that retries when any of its error types matches.
#[derive(Clone)]
pub struct RetryOn {
    types: Vec<ErrorType>,
}

impl RetryOn {
    /// Start with a single exact type.
    pub fn error<T>() -> Self
    where
        T: Error + 'static,
    {
        Self { types: vec![ErrorType::of::<T>()] }
    }

    /// Build from a runtime list of discriminators; the list must not be empty.
    pub fn from_types<I>(types: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = ErrorType>,
    {
        let types: Vec<ErrorType> = types.into_iter().collect();
        if types.is_empty() {
            return Err(PolicyError::EmptyTypeList);
        }
        Ok(Self { types })
    }

    pub fn or<T>(self) -> Self
    where
        T: Error + 'static,
    {
        self.or_type(ErrorType::of::<T>())
    }

    pub fn or_matching<T, F>(self, predicate: F) -> Self
    where
        T: Error + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.or_type(ErrorType::matching(predicate))
    }

    pub fn or_caused_by<T>(self) -> Self
    where
        T: Error + 'static,
    {
        self.or_type(ErrorType::caused_by::<T>())
    }

    pub fn or_type(mut self, error_type: ErrorType) -> Self {
        self.types.push(error_type);
        self
    }

    pub fn types(&self) -> &[ErrorType] {
        &self.types
    }

    pub fn matches(&self, error: &(dyn Error + 'static)) -> bool {
        self.types.iter().any(|t| t.matches(error))
    }

    /// Classify an optional error; `None` is a caller bug and is reported, never treated as
    /// "not transient".
    pub fn classify(&self, error: Option<&(dyn Error + 'static)>) -> Result<bool, PolicyError> {
        error.map(|e| self.matches(e)).ok_or(PolicyError::MissingError)
    }
}

impl fmt::Debug for RetryOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.types.iter().map(|t| t.name)).finish()
    }
}

impl<E> ErrorPolicy<E> for RetryOn
where
    E: Error + 'static,
{
    fn is_transient(&self, error: &E) -> bool {
        self.matches(error)
    }
}

/// Build a [`RetryOn`] policy from one or more error types.
///
/// `retry_on!(A, B, C)` retries when the error is an `A`, a `B` or a `C`.
#[macro_export]
macro_rules! retry_on {
    ($first:ty $(, $rest:ty)* $(,)?) => {
        $crate::RetryOn::error::<$first>()$(.or::<$rest>())*
    };
}
