use crate::future::ComposableFuture;
use crate::try_value::Try;

/// Run `handler` a fixed number of times, feeding each invocation the value
/// produced by the previous one.
///
/// The chain starts from `seed` and resolves with the value of the final
/// invocation. Zero iterations resolve with `seed` untouched. A failure at
/// any step short-circuits the remaining iterations and propagates unchanged.
pub fn repeat<T, H>(iterations: usize, seed: T, handler: H) -> ComposableFuture<T>
where
    T: Clone + Send + 'static,
    H: FnMut(T) -> ComposableFuture<T> + Send + 'static,
{
    let outcome = ComposableFuture::pending();
    repeat_step(iterations, seed, handler, outcome.clone());
    outcome
}

fn repeat_step<T, H>(remaining: usize, value: T, mut handler: H, outcome: ComposableFuture<T>)
where
    T: Clone + Send + 'static,
    H: FnMut(T) -> ComposableFuture<T> + Send + 'static,
{
    if remaining == 0 {
        outcome.resolve(Try::from_value(value));
        return;
    }
    handler(value).on_resolve(move |result| match result {
        Try::Success(next) => {
            repeat_step(remaining - 1, next, handler, outcome)
        }
        failure => {
            outcome.resolve(failure);
        }
    });
}

/// Invoke `supplier` until `stop` accepts the produced value.
///
/// Each produced value is tested with `stop`; the first accepted value
/// resolves the result, a rejected value triggers another invocation. A
/// failed invocation propagates unchanged and ends the loop. `supplier` is
/// expected to make progress towards the stop condition; the loop itself
/// places no bound on the number of invocations.
pub fn recursive<T, S, P>(supplier: S, stop: P) -> ComposableFuture<T>
where
    T: Clone + Send + 'static,
    S: FnMut() -> ComposableFuture<T> + Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    let outcome = ComposableFuture::pending();
    recursive_step(supplier, stop, outcome.clone());
    outcome
}

fn recursive_step<T, S, P>(mut supplier: S, mut stop: P, outcome: ComposableFuture<T>)
where
    T: Clone + Send + 'static,
    S: FnMut() -> ComposableFuture<T> + Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    supplier().on_resolve(move |result| match result {
        Try::Success(value) => {
            if stop(&value) {
                outcome.resolve(Try::from_value(value));
            } else {
                recursive_step(supplier, stop, outcome);
            }
        }
        failure => {
            outcome.resolve(failure);
        }
    });
}

/// Fold a sequence of elements through an asynchronous handler.
///
/// The handler receives each element together with the accumulator produced
/// by the previous element, starting from `seed`. Elements are handled
/// strictly one at a time, in input order. An empty sequence resolves with
/// `seed`; a failure short-circuits the remaining elements.
pub fn foreach<E, T, H>(elements: Vec<E>, seed: T, handler: H) -> ComposableFuture<T>
where
    E: Send + 'static,
    T: Clone + Send + 'static,
    H: FnMut(E, T) -> ComposableFuture<T> + Send + 'static,
{
    let outcome = ComposableFuture::pending();
    foreach_step(elements.into_iter(), seed, handler, outcome.clone());
    outcome
}

fn foreach_step<E, T, H>(
    mut elements: std::vec::IntoIter<E>,
    accumulator: T,
    mut handler: H,
    outcome: ComposableFuture<T>,
) where
    E: Send + 'static,
    T: Clone + Send + 'static,
    H: FnMut(E, T) -> ComposableFuture<T> + Send + 'static,
{
    match elements.next() {
        None => {
            outcome.resolve(Try::from_value(accumulator));
        }
        Some(element) => {
            handler(element, accumulator).on_resolve(move |result| match result {
                Try::Success(next) => {
                    foreach_step(elements, next, handler, outcome)
                }
                failure => {
                    outcome.resolve(failure);
                }
            });
        }
    }
}
