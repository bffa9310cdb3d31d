use crate::errors::{new_error, Error, FutureError, Result};
use crate::scheduler::Scheduler;
use crate::try_value::Try;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

type Continuation<T> = Box<dyn FnOnce(Try<T>) + Send>;

enum Resolution<T> {
    Pending(Vec<Continuation<T>>),
    Resolved(Try<T>),
}

struct Cell<T> {
    resolution: Mutex<Resolution<T>>,
    resolved: Condvar,
}

/// An asynchronous handle over a [Try] that will become available at most once.
///
/// A future starts out pending, and is resolved exactly once by a producer:
/// an explicit set on an [EagerComposableFuture](crate::EagerComposableFuture),
/// completion of a computation on a [Scheduler], or completion of a derived
/// combinator. Once resolved, the stored [Try] is immutable and is replayed to
/// every continuation, whether registered before or after resolution.
///
/// A continuation registered after resolution runs synchronously on the
/// registering thread. A continuation registered before resolution runs
/// exactly once, on whichever thread performs the resolution.
///
/// Cloning a future clones the handle, not the cell: all clones observe the
/// same resolution.
///
/// # Example
/// ```
/// use composable_futures::ComposableFuture;
///
/// let future = ComposableFuture::from_value(4).continue_on_success(|v| Ok(v + 2));
/// assert_eq!(Ok(6), future.get().map_err(|e| e.to_string()));
/// ```
pub struct ComposableFuture<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Clone for ComposableFuture<T> {
    fn clone(&self) -> Self {
        ComposableFuture {
            cell: self.cell.clone(),
        }
    }
}

impl<T> ComposableFuture<T>
where
    T: Clone + Send + 'static,
{
    /// Create a future in the pending state.
    ///
    /// Only this crate can resolve it; external producers go through
    /// [EagerComposableFuture](crate::EagerComposableFuture) or [Self::build].
    pub(crate) fn pending() -> ComposableFuture<T> {
        ComposableFuture {
            cell: Arc::new(Cell {
                resolution: Mutex::new(Resolution::Pending(Vec::new())),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Create an already-resolved future from a [Try].
    pub fn from_try(result: Try<T>) -> ComposableFuture<T> {
        ComposableFuture {
            cell: Arc::new(Cell {
                resolution: Mutex::new(Resolution::Resolved(result)),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Create an already-resolved future holding a value. No suspension.
    pub fn from_value(value: T) -> ComposableFuture<T> {
        Self::from_try(Try::from_value(value))
    }

    /// Create an already-resolved future holding an error. No suspension.
    pub fn from_error(error: Error) -> ComposableFuture<T> {
        Self::from_try(Try::from_error(error))
    }

    /// Adapt an external asynchronous producer.
    ///
    /// Returns a pending future, and invokes the registrar once, synchronously,
    /// with a consumer callback. The registrar is responsible for eventually
    /// invoking that callback with a [Try]; typically it registers a listener
    /// on some third-party handle that does so.
    ///
    /// # Example
    /// ```
    /// use composable_futures::{ComposableFuture, Try};
    ///
    /// let future = ComposableFuture::build(|consumer| {
    ///     // A real registrar would hand `consumer` to a listener instead.
    ///     consumer(Try::from_value(17));
    /// });
    /// assert_eq!(Ok(17), future.get().map_err(|e| e.to_string()));
    /// ```
    pub fn build<F>(registrar: F) -> ComposableFuture<T>
    where
        F: FnOnce(Box<dyn FnOnce(Try<T>) + Send>),
    {
        let future = ComposableFuture::pending();
        let resolver = future.clone();
        registrar(Box::new(move |result| {
            resolver.resolve(result);
        }));
        future
    }

    /// Transition pending -> resolved.
    ///
    /// The first writer wins; a later call is a no-op and returns false.
    /// Continuations are drained under the lock, but invoked after it is
    /// released, so a continuation may itself register on this future.
    pub(crate) fn resolve(&self, result: Try<T>) -> bool {
        let continuations = {
            let mut resolution = self.cell.resolution.lock().unwrap();
            match &mut *resolution {
                Resolution::Resolved(_) => return false,
                Resolution::Pending(continuations) => {
                    let continuations = std::mem::take(continuations);
                    *resolution = Resolution::Resolved(result.clone());
                    continuations
                }
            }
        };
        self.cell.resolved.notify_all();
        for continuation in continuations {
            continuation(result.clone());
        }
        true
    }

    /// Register a continuation, invoked exactly once with the eventual [Try].
    ///
    /// If this future is already resolved, the continuation runs synchronously
    /// on the calling thread. Otherwise it runs at resolution time, on the
    /// resolving thread.
    pub fn on_resolve<F>(&self, continuation: F)
    where
        F: FnOnce(Try<T>) + Send + 'static,
    {
        let result = {
            let mut resolution = self.cell.resolution.lock().unwrap();
            match &mut *resolution {
                Resolution::Pending(continuations) => {
                    continuations.push(Box::new(continuation));
                    return;
                }
                Resolution::Resolved(result) => result.clone(),
            }
        };
        continuation(result);
    }

    /// Chain a handler producing a new future.
    ///
    /// The returned future resolves when the future returned by the handler
    /// itself resolves. The handler always runs, whether this future resolved
    /// with a value or an error; a handler that cannot produce a follow-up
    /// returns an already-failed future.
    pub fn continue_with<U, F>(&self, handler: F) -> ComposableFuture<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Try<T>) -> ComposableFuture<U> + Send + 'static,
    {
        let downstream = ComposableFuture::pending();
        let resolver = downstream.clone();
        self.on_resolve(move |result| {
            handler(result).on_resolve(move |outcome| {
                resolver.resolve(outcome);
            });
        });
        downstream
    }

    /// Chain a handler that only runs on a success value.
    ///
    /// A failure passes through unchanged; an [Err] returned by the handler
    /// resolves the returned future with that failure.
    pub fn continue_on_success<U, F>(&self, handler: F) -> ComposableFuture<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        let downstream = ComposableFuture::pending();
        let resolver = downstream.clone();
        self.on_resolve(move |result| {
            resolver.resolve(result.map(handler));
        });
        downstream
    }

    /// Chain a handler that only runs on an error.
    ///
    /// A success passes through unchanged; an [Err] returned by the handler
    /// resolves the returned future with that new failure.
    pub fn continue_on_error<F>(&self, handler: F) -> ComposableFuture<T>
    where
        F: FnOnce(Error) -> Result<T> + Send + 'static,
    {
        let downstream = ComposableFuture::pending();
        let resolver = downstream.clone();
        self.on_resolve(move |result| {
            resolver.resolve(result.recover(handler));
        });
        downstream
    }

    /// Derive a time-bounded view of this future.
    ///
    /// The derived future resolves with this future's result if it arrives
    /// within `duration`, and with [FutureError::Timeout] otherwise. This is a
    /// race between two resolution sources; the first writer wins and the
    /// loser's result is discarded. The original future is not cancelled: it
    /// may still resolve later, but nothing observes that resolution through
    /// the derived future.
    pub fn with_timeout<Sch>(&self, duration: Duration, scheduler: &Sch) -> ComposableFuture<T>
    where
        Sch: Scheduler,
    {
        let derived = ComposableFuture::pending();

        let on_completion = derived.clone();
        self.on_resolve(move |result| {
            on_completion.resolve(result);
        });

        let on_timer = derived.clone();
        scheduler.schedule(move || Ok(()), duration).on_resolve(move |_| {
            on_timer.resolve(Try::from_error(new_error(FutureError::Timeout(duration))));
        });

        derived
    }

    /// Block the calling thread until resolution, then return the value or
    /// re-raise the captured error.
    ///
    /// A future that never resolves blocks forever; bound the wait with
    /// [Self::with_timeout] or [Self::get_within]. If the resolution cell was
    /// poisoned by a panicking producer, this surfaces
    /// [FutureError::Interrupted] rather than a computation failure.
    pub fn get(&self) -> Result<T> {
        let mut resolution = match self.cell.resolution.lock() {
            Ok(guard) => guard,
            Err(_) => return Err(new_error(FutureError::Interrupted)),
        };
        loop {
            if let Resolution::Resolved(result) = &*resolution {
                return result.clone().get();
            }
            resolution = match self.cell.resolved.wait(resolution) {
                Ok(guard) => guard,
                Err(_) => return Err(new_error(FutureError::Interrupted)),
            };
        }
    }

    /// Like [Self::get], but gives up with [FutureError::Timeout] if the
    /// future has not resolved within `duration`.
    pub fn get_within(&self, duration: Duration) -> Result<T> {
        let deadline = Instant::now() + duration;
        let mut resolution = match self.cell.resolution.lock() {
            Ok(guard) => guard,
            Err(_) => return Err(new_error(FutureError::Interrupted)),
        };
        loop {
            if let Resolution::Resolved(result) = &*resolution {
                return result.clone().get();
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(new_error(FutureError::Timeout(duration)));
            }
            resolution = match self.cell.resolved.wait_timeout(resolution, deadline - now) {
                Ok((guard, _)) => guard,
                Err(_) => return Err(new_error(FutureError::Interrupted)),
            };
        }
    }

    /// Whether this future has resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(
            &*self.cell.resolution.lock().unwrap(),
            Resolution::Resolved(_)
        )
    }

    /// The resolved [Try], if resolution already happened.
    pub fn peek(&self) -> Option<Try<T>> {
        match &*self.cell.resolution.lock().unwrap() {
            Resolution::Resolved(result) => Some(result.clone()),
            Resolution::Pending(_) => None,
        }
    }
}
