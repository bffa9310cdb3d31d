use crate::eager::EagerComposableFuture;
use crate::errors::{new_error, FutureError};
use crate::future::ComposableFuture;
use crate::try_value::Try;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

struct Gather<T> {
    slots: Vec<Option<Try<T>>>,
    remaining: usize,
}

/// Fan in an ordered collection of futures into one future of all their values.
///
/// The output preserves the input's positional association: slot `i` of the
/// result holds the value of `futures[i]`.
///
/// With `fail_fast = true`, the aggregate resolves with the first error to
/// arrive, as soon as it arrives, without waiting for the remaining futures.
/// With `fail_fast = false`, the aggregate waits for every input; if any
/// failed, it resolves with the first error in input order, only after all
/// inputs resolved.
///
/// Either way a failure surfaces as [FutureError::Aggregate] carrying the
/// qualifying cause, and the losing inputs keep running on their own schedule;
/// no cancellation is propagated.
///
/// # Example
/// ```
/// use composable_futures::{all, ComposableFuture};
///
/// let aggregate = all(
///     false,
///     vec![ComposableFuture::from_value(1), ComposableFuture::from_value(2)],
/// );
/// assert_eq!(Ok(vec![1, 2]), aggregate.get().map_err(|e| e.to_string()));
/// ```
pub fn all<T>(fail_fast: bool, futures: Vec<ComposableFuture<T>>) -> ComposableFuture<Vec<T>>
where
    T: Clone + Send + 'static,
{
    if futures.is_empty() {
        return ComposableFuture::from_value(Vec::new());
    }

    let aggregate = EagerComposableFuture::new();
    let state = Arc::new(Mutex::new(Gather {
        slots: vec![None; futures.len()],
        remaining: futures.len(),
    }));

    for (index, future) in futures.into_iter().enumerate() {
        let state = state.clone();
        let aggregate = aggregate.clone();
        future.on_resolve(move |result| {
            if fail_fast {
                if let Try::Failure(error) = &result {
                    aggregate.set_error(new_error(FutureError::Aggregate(error.clone())));
                }
            }
            let finished = {
                let mut state = state.lock().unwrap();
                state.slots[index] = Some(result);
                state.remaining -= 1;
                if state.remaining == 0 {
                    Some(std::mem::take(&mut state.slots))
                } else {
                    None
                }
            };
            if let Some(slots) = finished {
                aggregate.complete(collect(slots));
            }
        });
    }

    aggregate.into()
}

/// Fan in a keyed collection of futures into one future of all their values.
///
/// Same contract as [all], except each result is associated with its input's
/// key instead of its position.
pub fn all_keyed<K, T>(
    fail_fast: bool,
    futures: HashMap<K, ComposableFuture<T>>,
) -> ComposableFuture<HashMap<K, T>>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    let (keys, futures): (Vec<K>, Vec<ComposableFuture<T>>) = futures.into_iter().unzip();
    all(fail_fast, futures)
        .continue_on_success(move |values| Ok(keys.into_iter().zip(values).collect()))
}

// Shared with the batch combinators, which follow the same failure policy.
pub(crate) fn collect<T>(slots: Vec<Option<Try<T>>>) -> Try<Vec<T>> {
    let mut values = Vec::with_capacity(slots.len());
    let mut first_error = None;
    for slot in slots {
        match slot.expect("every input has resolved") {
            Try::Success(value) => values.push(value),
            Try::Failure(error) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
    }
    match first_error {
        None => Try::from_value(values),
        Some(error) => Try::from_error(new_error(FutureError::Aggregate(error))),
    }
}

#[cfg(test)]
mod tests {
    use super::{all, all_keyed};
    use crate::errors::{new_error, ErrorForTesting, FutureError};
    use crate::future::ComposableFuture;
    use crate::scheduler::Scheduler;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};
    use threadpool::ThreadPool;

    #[test]
    fn values_arrive_in_input_order() {
        let pool = ThreadPool::with_name("all test".into(), 2);
        let aggregate = all(
            false,
            vec![
                pool.schedule(|| Ok("slow"), Duration::from_millis(100)),
                ComposableFuture::from_value("fast1"),
                ComposableFuture::from_value("fast2"),
            ],
        );
        assert_eq!(
            Ok(vec!["slow", "fast1", "fast2"]),
            aggregate.get().map_err(|e| e.to_string()),
            "slot order follows input order, not completion order"
        );
    }

    #[test]
    fn fail_fast_resolves_with_bounded_latency() {
        let pool = ThreadPool::with_name("all test".into(), 2);
        let slow = pool.schedule(|| Ok("slow"), Duration::from_secs(1));
        let failed: ComposableFuture<&str> =
            ComposableFuture::from_error(new_error(ErrorForTesting::from("oops")));

        let started = Instant::now();
        let error = all(true, vec![slow, failed])
            .get()
            .expect_err("must surface the failure");
        assert!(
            started.elapsed() < Duration::from_millis(500),
            "fail-fast must not wait for the slow input"
        );
        assert!(matches!(
            error.downcast_ref::<FutureError>(),
            Some(FutureError::Aggregate(cause)) if cause.to_string() == "oops"
        ));
    }

    #[test]
    fn collect_all_waits_for_every_input() {
        let pool = ThreadPool::with_name("all test".into(), 2);
        let slow = pool.schedule(|| Ok("slow"), Duration::from_millis(200));
        let failed: ComposableFuture<&str> =
            ComposableFuture::from_error(new_error(ErrorForTesting::from("oops")));

        let started = Instant::now();
        all(false, vec![slow, failed])
            .get()
            .expect_err("must surface the failure");
        assert!(
            started.elapsed() >= Duration::from_millis(200),
            "collect-all resolves only after every input resolved"
        );
    }

    #[test]
    fn collect_all_reports_the_first_error_in_input_order() {
        let aggregate: ComposableFuture<Vec<i32>> = all(
            false,
            vec![
                ComposableFuture::from_error(new_error(ErrorForTesting::from("first"))),
                ComposableFuture::from_error(new_error(ErrorForTesting::from("second"))),
            ],
        );
        let error = aggregate.get().expect_err("must fail");
        assert!(matches!(
            error.downcast_ref::<FutureError>(),
            Some(FutureError::Aggregate(cause)) if cause.to_string() == "first"
        ));
    }

    #[test]
    fn empty_input_resolves_immediately() {
        let aggregate: ComposableFuture<Vec<i32>> = all(true, Vec::new());
        assert_eq!(Ok(Vec::new()), aggregate.get().map_err(|e| e.to_string()));
    }

    #[test]
    fn keyed_fan_in_preserves_identity() {
        let mut futures = HashMap::new();
        futures.insert("age", ComposableFuture::from_value(23));
        futures.insert("weight", ComposableFuture::from_value(70));
        let aggregate = all_keyed(false, futures);

        let values = aggregate.get().expect("no failure");
        assert_eq!(Some(&23), values.get("age"));
        assert_eq!(Some(&70), values.get("weight"));
        assert_eq!(2, values.len());
    }
}
