use crate::eager::EagerComposableFuture;
use crate::errors::{new_error, FutureError, Result};
use crate::future::ComposableFuture;
use crate::try_value::Try;
use std::sync::{Arc, Mutex};

struct Pair<A, B, F> {
    left: Option<A>,
    right: Option<B>,
    function: Option<F>,
}

struct Triple<A, B, C, F> {
    first: Option<A>,
    second: Option<B>,
    third: Option<C>,
    function: Option<F>,
}

/// Combine two futures by applying a function to both values.
///
/// The result resolves once both inputs resolved successfully. The function is
/// error-capturing: an [Err] it returns resolves the result with that failure.
/// If either input fails, the result resolves with
/// [FutureError::Aggregate] carrying the first failure to arrive, without
/// waiting for the other input.
///
/// # Example
/// ```
/// use composable_futures::{combine, ComposableFuture};
///
/// let name = ComposableFuture::from_value(String::from("haim"));
/// let age = ComposableFuture::from_value(23);
/// let greeting = combine(name, age, |name, age| Ok(format!("{} is {}", name, age)));
/// assert_eq!(Ok(String::from("haim is 23")), greeting.get().map_err(|e| e.to_string()));
/// ```
pub fn combine<A, B, R, F>(
    left: ComposableFuture<A>,
    right: ComposableFuture<B>,
    function: F,
) -> ComposableFuture<R>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    R: Clone + Send + 'static,
    F: FnOnce(A, B) -> Result<R> + Send + 'static,
{
    let aggregate = EagerComposableFuture::new();
    let state = Arc::new(Mutex::new(Pair {
        left: None,
        right: None,
        function: Some(function),
    }));

    {
        let state = state.clone();
        let aggregate = aggregate.clone();
        left.on_resolve(move |result| match result {
            Try::Failure(error) => {
                aggregate.set_error(new_error(FutureError::Aggregate(error)));
            }
            Try::Success(value) => {
                let ready = {
                    let mut state = state.lock().unwrap();
                    state.left = Some(value);
                    take_pair(&mut state)
                };
                if let Some((left, right, function)) = ready {
                    aggregate.complete(Try::apply(move || function(left, right)));
                }
            }
        });
    }
    {
        let aggregate = aggregate.clone();
        right.on_resolve(move |result| match result {
            Try::Failure(error) => {
                aggregate.set_error(new_error(FutureError::Aggregate(error)));
            }
            Try::Success(value) => {
                let ready = {
                    let mut state = state.lock().unwrap();
                    state.right = Some(value);
                    take_pair(&mut state)
                };
                if let Some((left, right, function)) = ready {
                    aggregate.complete(Try::apply(move || function(left, right)));
                }
            }
        });
    }

    aggregate.into()
}

fn take_pair<A, B, F>(state: &mut Pair<A, B, F>) -> Option<(A, B, F)> {
    if state.left.is_some() && state.right.is_some() {
        Some((
            state.left.take().expect("left value present"),
            state.right.take().expect("right value present"),
            state.function.take().expect("function applied at most once"),
        ))
    } else {
        None
    }
}

/// Combine three futures by applying a function to all three values.
///
/// Same contract as [combine].
pub fn combine3<A, B, C, R, F>(
    first: ComposableFuture<A>,
    second: ComposableFuture<B>,
    third: ComposableFuture<C>,
    function: F,
) -> ComposableFuture<R>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
    R: Clone + Send + 'static,
    F: FnOnce(A, B, C) -> Result<R> + Send + 'static,
{
    let aggregate = EagerComposableFuture::new();
    let state = Arc::new(Mutex::new(Triple {
        first: None,
        second: None,
        third: None,
        function: Some(function),
    }));

    {
        let state = state.clone();
        let aggregate = aggregate.clone();
        first.on_resolve(move |result| match result {
            Try::Failure(error) => {
                aggregate.set_error(new_error(FutureError::Aggregate(error)));
            }
            Try::Success(value) => {
                let ready = {
                    let mut state = state.lock().unwrap();
                    state.first = Some(value);
                    take_triple(&mut state)
                };
                apply_triple(&aggregate, ready);
            }
        });
    }
    {
        let state = state.clone();
        let aggregate = aggregate.clone();
        second.on_resolve(move |result| match result {
            Try::Failure(error) => {
                aggregate.set_error(new_error(FutureError::Aggregate(error)));
            }
            Try::Success(value) => {
                let ready = {
                    let mut state = state.lock().unwrap();
                    state.second = Some(value);
                    take_triple(&mut state)
                };
                apply_triple(&aggregate, ready);
            }
        });
    }
    {
        let aggregate = aggregate.clone();
        third.on_resolve(move |result| match result {
            Try::Failure(error) => {
                aggregate.set_error(new_error(FutureError::Aggregate(error)));
            }
            Try::Success(value) => {
                let ready = {
                    let mut state = state.lock().unwrap();
                    state.third = Some(value);
                    take_triple(&mut state)
                };
                apply_triple(&aggregate, ready);
            }
        });
    }

    aggregate.into()
}

fn apply_triple<A, B, C, R, F>(aggregate: &EagerComposableFuture<R>, ready: Option<(A, B, C, F)>)
where
    R: Clone + Send + 'static,
    F: FnOnce(A, B, C) -> Result<R>,
{
    if let Some((a, b, c, function)) = ready {
        aggregate.complete(Try::apply(move || function(a, b, c)));
    }
}

fn take_triple<A, B, C, F>(state: &mut Triple<A, B, C, F>) -> Option<(A, B, C, F)> {
    if state.first.is_some() && state.second.is_some() && state.third.is_some() {
        Some((
            state.first.take().expect("first value present"),
            state.second.take().expect("second value present"),
            state.third.take().expect("third value present"),
            state.function.take().expect("function applied at most once"),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{combine, combine3};
    use crate::errors::{new_error, ErrorForTesting, FutureError};
    use crate::future::ComposableFuture;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        age: i32,
        name: String,
        weight: f64,
    }

    #[test]
    fn combine3_applies_the_function_to_all_values() {
        let name = ComposableFuture::from_value(String::from("haim"));
        let age = ComposableFuture::from_value(23);
        let weight = ComposableFuture::from_value(70.3);

        let person = combine3(name, age, weight, |name, age, weight| {
            Ok(Person { age, name, weight })
        });
        assert_eq!(
            Ok(Person {
                age: 23,
                name: String::from("haim"),
                weight: 70.3,
            }),
            person.get().map_err(|e| e.to_string())
        );
    }

    #[test]
    fn function_errors_are_captured() {
        let left = ComposableFuture::from_value(String::from("1"));
        let right = ComposableFuture::from_value(2);
        let outcome: ComposableFuture<String> = combine(left, right, |_, _| {
            Err(new_error(ErrorForTesting::from("not the same...")))
        });
        let error = outcome.get().expect_err("the function error must surface");
        assert!(error.to_string().contains("not the same..."));
    }

    #[test]
    fn input_failure_wins_without_waiting() {
        let left: ComposableFuture<i32> =
            ComposableFuture::from_error(new_error(ErrorForTesting::from("bad input")));
        let never = crate::EagerComposableFuture::<i32>::new();

        let outcome = combine(left, never.future(), |a, b| Ok(a + b));
        let error = outcome.get().expect_err("must fail");
        assert!(matches!(
            error.downcast_ref::<FutureError>(),
            Some(FutureError::Aggregate(cause)) if cause.to_string() == "bad input"
        ));
    }
}
