use std::error;
use std::sync::Arc;
use std::time::Duration;

/// Error type used throughout the crate.
///
/// A resolved [Try](crate::Try) is replayed to every continuation registered on a future,
/// so the error must be sharable.
/// We use a shared pointer rather than requiring [Clone] on every error type,
/// because most errors in the standard library don't implement [Clone],
/// and it would probably be difficult for other types too.
pub type Error = Arc<dyn error::Error + Send + Sync>;

/// Result type used by fallible computations handed to this crate.
///
/// User-supplied functions report failure by returning [Err];
/// the combinator layer captures that as a `Failure` instead of propagating it.
pub type Result<T> = std::result::Result<T, Error>;

/// Wrap any error into an [Error].
pub fn new_error(error: impl error::Error + Send + Sync + 'static) -> Error {
    Arc::new(error)
}

/// Errors produced by the future core itself, as opposed to errors produced by
/// user-supplied computations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FutureError {
    /// Produced by [Try::ensure](crate::Try::ensure), when the success value fails the guard.
    #[error("predicate is not satisfied")]
    PredicateNotSatisfied,
    /// Produced by [ComposableFuture::with_timeout](crate::ComposableFuture::with_timeout)
    /// and [ComposableFuture::get_within](crate::ComposableFuture::get_within),
    /// when the duration elapses before resolution.
    #[error("future did not resolve within {0:?}")]
    Timeout(Duration),
    /// Produced by a blocking wait whose shared state was poisoned,
    /// as opposed to the future resolving with a `Failure`.
    #[error("interrupted while waiting for resolution")]
    Interrupted,
    /// Produced by [all](crate::all) and [combine](crate::combine),
    /// when at least one input failed.
    /// Carries the first qualifying failure.
    #[error("aggregate input failed: {0}")]
    Aggregate(#[source] Error),
}

#[cfg(test)]
mod for_testing {
    use std::error;
    use std::fmt;

    #[derive(Debug, Clone, Eq, PartialEq)]
    pub struct Error {
        text: String,
    }

    impl Error {
        pub fn new(text: String) -> Error {
            Error { text }
        }

        pub fn from(text: &str) -> Error {
            Self::new(String::from(text))
        }
    }

    impl error::Error for Error {}

    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.text)
        }
    }
}

#[cfg(test)]
pub type ErrorForTesting = for_testing::Error;
