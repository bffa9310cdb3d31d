use crate::errors::{new_error, Error, FutureError, Result};
use std::sync::Arc;

/// Represents a computation that either produced a value, or failed with an error.
///
/// Exactly one of the two variants is active.
/// Absence of a value is only representable via [Failure](Try::Failure);
/// a [Success](Try::Success) always carries a real value.
///
/// A [Try] is created from the outcome of a computation, handed to the next
/// combinator, and never mutated.
///
/// User-supplied functions passed to the error-capturing operations
/// ([apply](Try::apply), [map](Try::map), [flat_map](Try::flat_map),
/// [recover](Try::recover), [fold](Try::fold)) report failure by returning
/// [Err]; the returned error is captured as a [Failure](Try::Failure) instead
/// of propagating to the caller.
///
/// # Example
/// ```
/// use composable_futures::Try;
///
/// let outcome = Try::from_value(6).map(|v| Ok(7 * v));
/// assert_eq!(Some(&42), outcome.value());
/// ```
#[derive(Debug)]
pub enum Try<T> {
    /// The computation produced a value.
    Success(T),
    /// The computation failed.
    Failure(Error),
}

impl<T> Try<T> {
    /// Create a [Success](Try::Success) from the given value.
    pub fn from_value(value: T) -> Try<T> {
        Try::Success(value)
    }

    /// Create a [Failure](Try::Failure) from the given error.
    pub fn from_error(error: Error) -> Try<T> {
        Try::Failure(error)
    }

    /// Evaluate the supplier, capturing a returned [Err] as a [Failure](Try::Failure).
    pub fn apply<F>(supplier: F) -> Try<T>
    where
        F: FnOnce() -> Result<T>,
    {
        match supplier() {
            Ok(value) => Try::Success(value),
            Err(error) => Try::Failure(error),
        }
    }

    /// Flatten a nested [Try].
    ///
    /// An outer [Failure](Try::Failure) stays a failure; otherwise the inner [Try] is returned.
    pub fn flatten(nested: Try<Try<T>>) -> Try<T> {
        match nested {
            Try::Success(inner) => inner,
            Try::Failure(error) => Try::Failure(error),
        }
    }

    /// Returns true if this is a [Success](Try::Success).
    pub fn is_success(&self) -> bool {
        matches!(self, Try::Success(_))
    }

    /// Returns true if this is a [Failure](Try::Failure).
    pub fn is_failure(&self) -> bool {
        matches!(self, Try::Failure(_))
    }

    /// Map the success value to a new value.
    ///
    /// The function is only invoked on [Success](Try::Success);
    /// a [Failure](Try::Failure) passes through unchanged.
    /// An [Err] returned by the function is captured as a [Failure](Try::Failure).
    pub fn map<U, F>(self, function: F) -> Try<U>
    where
        F: FnOnce(T) -> Result<U>,
    {
        match self {
            Try::Success(value) => Try::apply(move || function(value)),
            Try::Failure(error) => Try::Failure(error),
        }
    }

    /// Map the success value to a new [Try], flattening the result.
    pub fn flat_map<U, F>(self, function: F) -> Try<U>
    where
        F: FnOnce(T) -> Try<U>,
    {
        match self {
            Try::Success(value) => function(value),
            Try::Failure(error) => Try::Failure(error),
        }
    }

    /// Recover a [Failure](Try::Failure) into a [Success](Try::Success).
    ///
    /// Identity on [Success](Try::Success).
    /// An [Err] returned by the recovery function is captured as a new [Failure](Try::Failure).
    pub fn recover<F>(self, recovery: F) -> Try<T>
    where
        F: FnOnce(Error) -> Result<T>,
    {
        match self {
            Try::Success(value) => Try::Success(value),
            Try::Failure(error) => Try::apply(move || recovery(error)),
        }
    }

    /// Recover a [Failure](Try::Failure) into a new [Try].
    ///
    /// Identity on [Success](Try::Success).
    pub fn recover_with<F>(self, recovery: F) -> Try<T>
    where
        F: FnOnce(Error) -> Try<T>,
    {
        match self {
            Try::Success(value) => Try::Success(value),
            Try::Failure(error) => recovery(error),
        }
    }

    /// Apply `mapper` on [Success](Try::Success), or `recovery` on [Failure](Try::Failure).
    ///
    /// Neither branch is error-capturing: both functions are trusted to
    /// produce a [Try] directly.
    pub fn transform<U, MapFn, RecoverFn>(self, mapper: MapFn, recovery: RecoverFn) -> Try<U>
    where
        MapFn: FnOnce(T) -> Try<U>,
        RecoverFn: FnOnce(Error) -> Try<U>,
    {
        match self {
            Try::Success(value) => mapper(value),
            Try::Failure(error) => recovery(error),
        }
    }

    /// Apply `mapper` on [Success](Try::Success), or `recovery` on [Failure](Try::Failure),
    /// capturing an [Err] from either branch as a [Failure](Try::Failure).
    ///
    /// Symmetric with [map](Try::map)/[recover](Try::recover);
    /// a failing `mapper` is not re-routed through `recovery`.
    pub fn fold<U, MapFn, RecoverFn>(self, mapper: MapFn, recovery: RecoverFn) -> Try<U>
    where
        MapFn: FnOnce(T) -> Result<U>,
        RecoverFn: FnOnce(Error) -> Result<U>,
    {
        match self {
            Try::Success(value) => Try::apply(move || mapper(value)),
            Try::Failure(error) => Try::apply(move || recovery(error)),
        }
    }

    /// Ensure the success value satisfies the predicate.
    ///
    /// A [Success](Try::Success) whose value fails the predicate becomes a
    /// [Failure](Try::Failure) with [FutureError::PredicateNotSatisfied].
    /// Identity on [Failure](Try::Failure).
    pub fn ensure<F>(self, predicate: F) -> Try<T>
    where
        F: FnOnce(&T) -> bool,
    {
        match self {
            Try::Success(value) => {
                if predicate(&value) {
                    Try::Success(value)
                } else {
                    Try::Failure(new_error(FutureError::PredicateNotSatisfied))
                }
            }
            Try::Failure(error) => Try::Failure(error),
        }
    }

    /// Return the value, or re-raise the captured error.
    ///
    /// Together with [ComposableFuture::get](crate::ComposableFuture::get),
    /// this is the only operation that turns a captured failure back into a
    /// caller-visible [Err].
    pub fn get(self) -> Result<T> {
        match self {
            Try::Success(value) => Ok(value),
            Try::Failure(error) => Err(error),
        }
    }

    /// The value, if this is a [Success](Try::Success).
    pub fn value(&self) -> Option<&T> {
        match self {
            Try::Success(value) => Some(value),
            Try::Failure(_) => None,
        }
    }

    /// The error, if this is a [Failure](Try::Failure).
    pub fn error(&self) -> Option<&Error> {
        match self {
            Try::Success(_) => None,
            Try::Failure(error) => Some(error),
        }
    }

    /// The value on [Success](Try::Success), or the default on [Failure](Try::Failure).
    pub fn get_or_else(self, default_value: T) -> T {
        match self {
            Try::Success(value) => value,
            Try::Failure(_) => default_value,
        }
    }

    /// This [Try] on [Success](Try::Success), or the default on [Failure](Try::Failure).
    pub fn or_else(self, default_try: Try<T>) -> Try<T> {
        match self {
            Try::Success(value) => Try::Success(value),
            Try::Failure(_) => default_try,
        }
    }

    /// Feed the value to the consumer, if this is a [Success](Try::Success).
    ///
    /// Takes no action on [Failure](Try::Failure).
    pub fn for_each<F>(&self, consumer: F)
    where
        F: FnOnce(&T),
    {
        if let Try::Success(value) = self {
            consumer(value);
        }
    }

    /// Convert to an [Option], discarding the error.
    pub fn to_option(self) -> Option<T> {
        match self {
            Try::Success(value) => Some(value),
            Try::Failure(_) => None,
        }
    }
}

impl<T: Clone> Clone for Try<T> {
    fn clone(&self) -> Self {
        match self {
            Try::Success(value) => Try::Success(value.clone()),
            Try::Failure(error) => Try::Failure(error.clone()),
        }
    }
}

/// Equality is by the contained value; failures compare by error identity
/// (the same shared error pointer), since arbitrary errors are not comparable.
impl<T: PartialEq> PartialEq for Try<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Try::Success(x), Try::Success(y)) => x == y,
            (Try::Failure(x), Try::Failure(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl<T> From<Result<T>> for Try<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Try::Success(value),
            Err(error) => Try::Failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Try;
    use crate::errors::{new_error, Error, ErrorForTesting, FutureError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn failure<T>(text: &str) -> Try<T> {
        Try::from_error(new_error(ErrorForTesting::from(text)))
    }

    fn error_text(error: &Error) -> String {
        error.to_string()
    }

    #[test]
    fn map_applies_on_success() {
        let outcome = Try::from_value(4).map(|v| Ok(v + 2));
        assert_eq!(Some(&6), outcome.value());
    }

    #[test]
    fn map_captures_errors() {
        let outcome: Try<i32> =
            Try::from_value(4).map(|_| Err(new_error(ErrorForTesting::from("boom"))));
        assert_eq!(
            "boom",
            error_text(outcome.error().expect("map must capture the error"))
        );
    }

    #[test]
    fn map_skips_function_on_failure() {
        let invocations = AtomicUsize::new(0);
        let outcome: Try<i32> = failure::<i32>("original").map(|v| {
            invocations.fetch_add(1, Ordering::SeqCst);
            Ok(v)
        });
        assert_eq!(
            0,
            invocations.load(Ordering::SeqCst),
            "map mustn't invoke the function on failure"
        );
        assert_eq!("original", error_text(outcome.error().unwrap()));
    }

    #[test]
    fn flatten_works() {
        assert_eq!(
            Some(&17),
            Try::flatten(Try::from_value(Try::from_value(17))).value()
        );
        assert_eq!(
            "inner",
            error_text(
                Try::<i32>::flatten(Try::from_value(failure("inner")))
                    .error()
                    .unwrap()
            )
        );
        assert_eq!(
            "outer",
            error_text(
                Try::<i32>::flatten(failure("outer")).error().unwrap()
            )
        );
    }

    #[test]
    fn flat_map_works() {
        assert_eq!(
            Some(&8),
            Try::from_value(4).flat_map(|v| Try::from_value(v * 2)).value()
        );
        assert!(failure::<i32>("nope")
            .flat_map(|v| Try::from_value(v * 2))
            .is_failure());
    }

    #[test]
    fn recover_is_identity_on_success() {
        let outcome = Try::from_value(3).recover(|_| Ok(99));
        assert_eq!(Some(&3), outcome.value());
    }

    #[test]
    fn recover_converts_failure() {
        let outcome = failure::<String>("sad").recover(|error| Ok(error.to_string()));
        assert_eq!(Some(&String::from("sad")), outcome.value());
    }

    #[test]
    fn recover_with_works() {
        let outcome = failure::<i32>("sad").recover_with(|_| Try::from_value(7));
        assert_eq!(Some(&7), outcome.value());
    }

    #[test]
    fn transform_picks_the_matching_branch() {
        assert_eq!(
            Some(&5),
            Try::from_value(4)
                .transform(|v| Try::from_value(v + 1), |_| Try::from_value(0))
                .value()
        );
        assert_eq!(
            Some(&0),
            failure::<i32>("sad")
                .transform(|v| Try::from_value(v + 1), |_| Try::from_value(0))
                .value()
        );
    }

    #[test]
    fn fold_captures_errors_on_both_sides() {
        let outcome: Try<i32> =
            Try::from_value(1).fold(|_| Err(new_error(ErrorForTesting::from("mapper"))), |_| Ok(0));
        assert_eq!(
            "mapper",
            error_text(outcome.error().unwrap()),
            "a failing mapper is not re-routed through the recovery function"
        );

        let outcome: Try<i32> = failure::<i32>("sad")
            .fold(|v| Ok(v), |_| Err(new_error(ErrorForTesting::from("recovery"))));
        assert_eq!("recovery", error_text(outcome.error().unwrap()));
    }

    #[test]
    fn ensure_works() {
        assert_eq!(Some(&4), Try::from_value(4).ensure(|v| v % 2 == 0).value());

        let rejected = Try::from_value(5).ensure(|v| v % 2 == 0);
        let error = rejected.error().expect("predicate rejection yields a failure");
        assert!(matches!(
            error.downcast_ref::<FutureError>(),
            Some(FutureError::PredicateNotSatisfied)
        ));

        assert!(failure::<i32>("sad").ensure(|_| true).is_failure());
    }

    #[test]
    fn get_reraises() {
        assert_eq!(Ok(4), Try::from_value(4).get().map_err(|e| e.to_string()));
        assert_eq!(
            Err(String::from("sad")),
            failure::<i32>("sad").get().map_err(|e| e.to_string())
        );
    }

    #[test]
    fn accessors_work() {
        assert_eq!(None, Try::from_value(4).error().map(|e| e.to_string()));
        assert_eq!(None, failure::<i32>("sad").value());
        assert_eq!(4, Try::from_value(4).get_or_else(9));
        assert_eq!(9, failure::<i32>("sad").get_or_else(9));
        assert_eq!(
            Some(&1),
            failure::<i32>("sad").or_else(Try::from_value(1)).value()
        );
        assert_eq!(Some(4), Try::from_value(4).to_option());
        assert_eq!(None, failure::<i32>("sad").to_option());
    }

    #[test]
    fn for_each_only_runs_on_success() {
        let invocations = AtomicUsize::new(0);
        Try::from_value(4).for_each(|_| {
            invocations.fetch_add(1, Ordering::SeqCst);
        });
        failure::<i32>("sad").for_each(|_| {
            invocations.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(1, invocations.load(Ordering::SeqCst));
    }
}
