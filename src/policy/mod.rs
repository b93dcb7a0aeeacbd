//! Outcome classification.
//!
//! An [`ErrorPolicy`] decides whether an error is transient (worth another attempt); a
//! [`ResultPolicy`] decides whether a returned value is acceptable or a soft failure. Both are
//! pure predicates shared behind `Arc`, and the executor never consults one for the other's
//! outcome.

pub mod error;
pub mod result;

pub use error::{AnyError, ErrorPolicy, ErrorType, NoError, RetryOn};
pub use result::{ResultPolicy, RetryIfResult};

/// Invalid arguments handed to a policy or policy constructor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// `classify` was called without an error to classify.
    #[error("an error is required for classification")]
    MissingError,
    /// `retry_on` needs at least one error type.
    #[error("retry_on requires at least one error type")]
    EmptyTypeList,
}
