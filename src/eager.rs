use crate::errors::Error;
use crate::future::ComposableFuture;
use crate::try_value::Try;

/// A promise: a [ComposableFuture] whose resolution is driven by an external
/// producer calling [set](EagerComposableFuture::set) or
/// [set_error](EagerComposableFuture::set_error), rather than by an internal
/// computation.
///
/// This is the building block every other future is made of, and the sole
/// mechanism by which externally driven asynchronous results enter the system:
/// a scheduler completes a task by calling `set` on the promise backing the
/// future it returned.
///
/// "Eager" denotes that the promise is a first-class resolvable cell from the
/// moment it is created, not a deferred description of work.
///
/// # Resolution policy
/// A promise resolves at most once. The second and later calls to
/// [set](EagerComposableFuture::set), [set_error](EagerComposableFuture::set_error)
/// or [complete](EagerComposableFuture::complete) are no-ops; each call returns
/// whether it was the one that performed the resolution.
///
/// # Example
/// ```
/// use composable_futures::EagerComposableFuture;
///
/// let promise = EagerComposableFuture::new();
/// let future = promise.future();
/// assert!(promise.set(42));
/// assert!(!promise.set(43), "the first writer wins");
/// assert_eq!(Ok(42), future.get().map_err(|e| e.to_string()));
/// ```
pub struct EagerComposableFuture<T> {
    future: ComposableFuture<T>,
}

impl<T> EagerComposableFuture<T>
where
    T: Clone + Send + 'static,
{
    /// Create a promise in the pending state.
    pub fn new() -> EagerComposableFuture<T> {
        EagerComposableFuture {
            future: ComposableFuture::pending(),
        }
    }

    /// Resolve with a value. Returns false if already resolved.
    pub fn set(&self, value: T) -> bool {
        self.future.resolve(Try::from_value(value))
    }

    /// Resolve with an error. Returns false if already resolved.
    pub fn set_error(&self, error: Error) -> bool {
        self.future.resolve(Try::from_error(error))
    }

    /// Resolve with an already-computed [Try]. Returns false if already resolved.
    pub fn complete(&self, result: Try<T>) -> bool {
        self.future.resolve(result)
    }

    /// The future observing this promise.
    pub fn future(&self) -> ComposableFuture<T> {
        self.future.clone()
    }
}

impl<T> Default for EagerComposableFuture<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EagerComposableFuture<T> {
    fn clone(&self) -> Self {
        EagerComposableFuture {
            future: self.future.clone(),
        }
    }
}

impl<T> From<EagerComposableFuture<T>> for ComposableFuture<T> {
    fn from(promise: EagerComposableFuture<T>) -> Self {
        promise.future
    }
}

#[cfg(test)]
mod tests {
    use super::EagerComposableFuture;
    use crate::errors::{new_error, ErrorForTesting};
    use crate::try_value::Try;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn second_set_is_a_no_op() {
        let promise = EagerComposableFuture::new();
        assert!(promise.set(1), "the first set resolves");
        assert!(!promise.set(2), "the second set is a no-op");
        assert!(
            !promise.set_error(new_error(ErrorForTesting::from("late"))),
            "a late error is a no-op too"
        );
        assert_eq!(Ok(1), promise.future().get().map_err(|e| e.to_string()));
    }

    #[test]
    fn set_error_resolves_with_a_failure() {
        let promise: EagerComposableFuture<i32> = EagerComposableFuture::new();
        assert!(promise.set_error(new_error(ErrorForTesting::from("sad"))));
        assert_eq!(
            Err(String::from("sad")),
            promise.future().get().map_err(|e| e.to_string())
        );
    }

    #[test]
    fn complete_accepts_a_try() {
        let promise = EagerComposableFuture::new();
        assert!(promise.complete(Try::from_value(5)));
        assert_eq!(Some(&5), promise.future().peek().unwrap().value());
    }

    #[test]
    fn concurrent_set_has_exactly_one_winner() {
        let promise: EagerComposableFuture<usize> = EagerComposableFuture::new();
        let continuation_runs = Arc::new(AtomicUsize::new(0));
        {
            let continuation_runs = continuation_runs.clone();
            promise.future().on_resolve(move |_| {
                continuation_runs.fetch_add(1, Ordering::SeqCst);
            });
        }

        let wins = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|index| {
                let promise = promise.clone();
                let wins = wins.clone();
                thread::spawn(move || {
                    if promise.set(index) {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(1, wins.load(Ordering::SeqCst), "exactly one set call wins");
        assert_eq!(
            1,
            continuation_runs.load(Ordering::SeqCst),
            "the continuation fires exactly once"
        );
    }
}
