//! Terminal failures of a retry execution
//!
//! The caller always observes the last real outcome: a permanent or exhausted failure carries the
//! operation's own error (and displays as that error), a soft failure carries the last rejected
//! value. Cancellation is its own variant and never goes through the policies.
use std::fmt;

/// Which limit ended an execution whose outcomes were still retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// The configured number of attempts was reached.
    MaxAttempts,
    /// The configured elapsed-time budget was used up.
    MaxElapsed,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::MaxAttempts => write!(f, "max attempts"),
            Limit::MaxElapsed => write!(f, "max elapsed time"),
        }
    }
}

/// Failure of a retry execution over an operation producing `Result<T, E>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<T, E> {
    /// The error policy classified the error as permanent; no further attempts were made.
    Permanent { error: E, attempts: usize },
    /// The last error was transient but a limit was reached.
    Exhausted { error: E, attempts: usize, limit: Limit },
    /// The result policy kept rejecting values until a limit was reached.
    Rejected { value: T, attempts: usize, limit: Limit },
    /// The cancellation signal was observed; `attempts` invocations had completed.
    Cancelled { attempts: usize },
}

impl<T, E: fmt::Display> fmt::Display for RetryError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent { error, .. } | Self::Exhausted { error, .. } => {
                fmt::Display::fmt(error, f)
            }
            Self::Rejected { attempts, limit, .. } => {
                write!(f, "result rejected after {} attempts ({} reached)", attempts, limit)
            }
            Self::Cancelled { attempts } => {
                write!(f, "retry cancelled after {} attempts", attempts)
            }
        }
    }
}

impl<T, E> std::error::Error for RetryError<T, E>
where
    T: fmt::Debug,
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Permanent { error, .. } | Self::Exhausted { error, .. } => error.source(),
            _ => None,
        }
    }
}

impl<T, E> RetryError<T, E> {
    /// Number of completed invocations of the operation.
    pub fn attempts(&self) -> usize {
        match self {
            Self::Permanent { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Rejected { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    /// The limit that ended the execution, for exhausted and rejected outcomes.
    pub fn limit(&self) -> Option<Limit> {
        match self {
            Self::Exhausted { limit, .. } | Self::Rejected { limit, .. } => Some(*limit),
            _ => None,
        }
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Borrow the operation's error, if the execution ended on one.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Permanent { error, .. } | Self::Exhausted { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Take the operation's error, if the execution ended on one.
    pub fn into_error(self) -> Option<E> {
        match self {
            Self::Permanent { error, .. } | Self::Exhausted { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Borrow the last rejected value.
    pub fn rejected(&self) -> Option<&T> {
        match self {
            Self::Rejected { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Take the last rejected value.
    pub fn into_rejected(self) -> Option<T> {
        match self {
            Self::Rejected { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("inner")]
    struct Inner;

    #[test]
    fn error_variants_are_transparent() {
        let permanent: RetryError<(), Outer> =
            RetryError::Permanent { error: Outer(Inner), attempts: 1 };
        assert_eq!(permanent.to_string(), "outer");
        assert_eq!(permanent.source().map(|s| s.to_string()), Some("inner".to_string()));

        let exhausted: RetryError<(), Outer> =
            RetryError::Exhausted { error: Outer(Inner), attempts: 3, limit: Limit::MaxAttempts };
        assert_eq!(exhausted.to_string(), "outer");
        assert_eq!(exhausted.into_error(), Some(Outer(Inner)));
    }

    #[test]
    fn rejected_and_cancelled_display() {
        let rejected: RetryError<i32, Inner> =
            RetryError::Rejected { value: -1, attempts: 4, limit: Limit::MaxElapsed };
        assert_eq!(
            rejected.to_string(),
            "result rejected after 4 attempts (max elapsed time reached)"
        );
        assert!(rejected.source().is_none());
        assert_eq!(rejected.rejected(), Some(&-1));

        let cancelled: RetryError<i32, Inner> = RetryError::Cancelled { attempts: 2 };
        assert_eq!(cancelled.to_string(), "retry cancelled after 2 attempts");
        assert!(cancelled.error().is_none());
    }

    #[test]
    fn accessors_cover_all_variants() {
        let cases: Vec<RetryError<u8, Inner>> = vec![
            RetryError::Permanent { error: Inner, attempts: 1 },
            RetryError::Exhausted { error: Inner, attempts: 2, limit: Limit::MaxAttempts },
            RetryError::Rejected { value: 0, attempts: 3, limit: Limit::MaxAttempts },
            RetryError::Cancelled { attempts: 4 },
        ];
        let attempts: Vec<usize> = cases.iter().map(RetryError::attempts).collect();
        assert_eq!(attempts, vec![1, 2, 3, 4]);

        assert!(cases[0].is_permanent() && cases[0].limit().is_none());
        assert!(cases[1].is_exhausted() && cases[1].limit() == Some(Limit::MaxAttempts));
        assert!(cases[2].is_rejected());
        assert!(cases[3].is_cancelled());
        assert_eq!(cases[2].clone().into_rejected(), Some(0));
        assert!(cases[3].clone().into_error().is_none());
    }
}
