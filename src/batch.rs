use crate::all::{all, collect};
use crate::eager::EagerComposableFuture;
use crate::future::ComposableFuture;
use crate::stream::{FutureStream, Observer};
use crate::try_value::Try;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct Window<E, U> {
    queue: VecDeque<(usize, E)>,
    slots: Vec<Option<Try<U>>>,
    filled: usize,
}

struct BatchRun<E, U, H> {
    state: Mutex<Window<E, U>>,
    handler: H,
    ordered: bool,
    aggregate: EagerComposableFuture<Vec<U>>,
}

/// Process a sequence of elements through an asynchronous handler, with at
/// most `parallelism` invocations in flight concurrently.
///
/// Admission is a sliding window: completing one element admits the next, so
/// the in-flight count is bounded by `parallelism` regardless of the
/// underlying executor's capacity. A `parallelism` of zero is treated as one.
///
/// The output preserves input order. A failed element does not abort the
/// batch: every element is still handled, and the aggregate then fails with
/// [FutureError::Aggregate](crate::FutureError::Aggregate) carrying the first
/// failure in input order, consistent with [all](crate::all) without fail-fast.
pub fn batch<E, U, H>(
    elements: Vec<E>,
    parallelism: usize,
    handler: H,
) -> ComposableFuture<Vec<U>>
where
    E: Send + 'static,
    U: Clone + Send + 'static,
    H: Fn(E) -> ComposableFuture<U> + Send + Sync + 'static,
{
    run_batch(elements, parallelism, handler, true)
}

/// Like [batch], but the output is in completion order instead of input order.
///
/// On failure the aggregate carries the first failure in completion order.
pub fn batch_unordered<E, U, H>(
    elements: Vec<E>,
    parallelism: usize,
    handler: H,
) -> ComposableFuture<Vec<U>>
where
    E: Send + 'static,
    U: Clone + Send + 'static,
    H: Fn(E) -> ComposableFuture<U> + Send + Sync + 'static,
{
    run_batch(elements, parallelism, handler, false)
}

fn run_batch<E, U, H>(
    elements: Vec<E>,
    parallelism: usize,
    handler: H,
    ordered: bool,
) -> ComposableFuture<Vec<U>>
where
    E: Send + 'static,
    U: Clone + Send + 'static,
    H: Fn(E) -> ComposableFuture<U> + Send + Sync + 'static,
{
    if elements.is_empty() {
        return ComposableFuture::from_value(Vec::new());
    }

    let total = elements.len();
    let width = parallelism.max(1);
    let run = Arc::new(BatchRun {
        state: Mutex::new(Window {
            queue: elements.into_iter().enumerate().collect(),
            slots: vec![None; total],
            filled: 0,
        }),
        handler,
        ordered,
        aggregate: EagerComposableFuture::new(),
    });

    for _ in 0..width.min(total) {
        admit(&run);
    }

    run.aggregate.clone().into()
}

/// Admit the next queued element into the window, if any.
///
/// Called once at startup per window slot, and once per completion, so the
/// number of admitted-but-unresolved elements never exceeds the window width.
fn admit<E, U, H>(run: &Arc<BatchRun<E, U, H>>)
where
    E: Send + 'static,
    U: Clone + Send + 'static,
    H: Fn(E) -> ComposableFuture<U> + Send + Sync + 'static,
{
    let admitted = run.state.lock().unwrap().queue.pop_front();
    if let Some((index, element)) = admitted {
        let future = (run.handler)(element);
        let run = run.clone();
        future.on_resolve(move |result| {
            let finished = {
                let mut state = run.state.lock().unwrap();
                let slot = if run.ordered { index } else { state.filled };
                state.slots[slot] = Some(result);
                state.filled += 1;
                if state.filled == state.slots.len() {
                    Some(std::mem::take(&mut state.slots))
                } else {
                    None
                }
            };
            match finished {
                Some(slots) => {
                    run.aggregate.complete(collect(slots));
                }
                None => admit(&run),
            }
        });
    }
}

/// Like [batch], but emits results as a lazy, finite, non-restartable push
/// sequence instead of waiting for the full collection.
///
/// Elements are processed in slices of `parallelism`: each slice runs
/// concurrently, is emitted as one stream element once every member resolved,
/// and only then is the next slice admitted. Production starts when the
/// stream is consumed. A failed slice is emitted as a failure element; the
/// remaining slices are still processed.
pub fn batch_to_stream<E, U, H>(
    elements: Vec<E>,
    parallelism: usize,
    handler: H,
) -> FutureStream<Vec<U>>
where
    E: Send + 'static,
    U: Clone + Send + 'static,
    H: Fn(E) -> ComposableFuture<U> + Send + Sync + 'static,
{
    let width = parallelism.max(1);
    FutureStream::new(move |observer| {
        let mut slices: VecDeque<Vec<E>> = VecDeque::new();
        let mut elements = elements.into_iter();
        loop {
            let slice: Vec<E> = elements.by_ref().take(width).collect();
            if slice.is_empty() {
                break;
            }
            slices.push_back(slice);
        }
        emit_slices(slices, Arc::new(handler), observer);
    })
}

fn emit_slices<E, U, H>(
    mut slices: VecDeque<Vec<E>>,
    handler: Arc<H>,
    mut observer: Box<dyn Observer<Vec<U>>>,
) where
    E: Send + 'static,
    U: Clone + Send + 'static,
    H: Fn(E) -> ComposableFuture<U> + Send + Sync + 'static,
{
    match slices.pop_front() {
        None => observer.on_complete(),
        Some(slice) => {
            let futures = slice.into_iter().map(|element| (handler)(element)).collect();
            all(false, futures).on_resolve(move |result| {
                observer.on_next(result);
                emit_slices(slices, handler, observer);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{batch, batch_to_stream, batch_unordered};
    use crate::errors::{new_error, ErrorForTesting, FutureError};
    use crate::future::ComposableFuture;
    use crate::scheduler::Scheduler;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use threadpool::ThreadPool;

    #[test]
    fn preserves_input_order() {
        let pool = ThreadPool::with_name("batch test".into(), 4);
        let results = batch((1..=10).collect(), 2, move |element: i32| {
            let jitter = rand::thread_rng().gen_range(1..20);
            pool.schedule(move || Ok(format!("num:{}", element)), Duration::from_millis(jitter))
        })
        .get()
        .expect("no failure");

        let expected: Vec<String> = (1..=10).map(|n| format!("num:{}", n)).collect();
        assert_eq!(expected, results);
    }

    #[test]
    fn in_flight_never_exceeds_the_window() {
        let pool = ThreadPool::with_name("batch test".into(), 8);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let results = {
            let in_flight = in_flight.clone();
            let high_water = high_water.clone();
            batch((1..=10).collect(), 2, move |element: i32| {
                let admitted = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                high_water.fetch_max(admitted, Ordering::SeqCst);
                let in_flight = in_flight.clone();
                pool.schedule(
                    move || {
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(element)
                    },
                    Duration::from_millis(20),
                )
            })
            .get()
            .expect("no failure")
        };

        assert_eq!(10, results.len());
        assert!(
            high_water.load(Ordering::SeqCst) <= 2,
            "no more than 2 handler invocations may be outstanding, saw {}",
            high_water.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn unordered_returns_every_result() {
        let pool = ThreadPool::with_name("batch test".into(), 4);
        let mut results = batch_unordered((1..=10).collect(), 3, move |element: i32| {
            let jitter = rand::thread_rng().gen_range(1..20);
            pool.schedule(move || Ok(element), Duration::from_millis(jitter))
        })
        .get()
        .expect("no failure");

        results.sort_unstable();
        assert_eq!((1..=10).collect::<Vec<i32>>(), results);
    }

    #[test]
    fn a_failed_element_does_not_abort_the_batch() {
        let handled = Arc::new(AtomicUsize::new(0));
        let error = {
            let handled = handled.clone();
            batch((1..=5).collect(), 2, move |element: i32| {
                handled.fetch_add(1, Ordering::SeqCst);
                if element == 3 {
                    ComposableFuture::from_error(new_error(ErrorForTesting::from("third")))
                } else {
                    ComposableFuture::from_value(element)
                }
            })
            .get()
            .expect_err("the aggregate fails once every element was handled")
        };

        assert_eq!(
            5,
            handled.load(Ordering::SeqCst),
            "every element is still handled"
        );
        assert!(matches!(
            error.downcast_ref::<FutureError>(),
            Some(FutureError::Aggregate(cause)) if cause.to_string() == "third"
        ));
    }

    #[test]
    fn stream_emits_width_sized_slices() {
        let pool = ThreadPool::with_name("batch test".into(), 4);
        let stream = batch_to_stream((1..=10).collect(), 2, move |element: i32| {
            pool.schedule(move || Ok(format!("num:{}", element)), Duration::from_millis(5))
        });

        let mut total = 0;
        for slice in stream.blocking_iter() {
            let slice = slice.get().expect("no failure");
            assert_eq!(2, slice.len(), "every slice holds exactly `width` elements");
            total += slice.len();
        }
        assert_eq!(10, total);
    }

    #[test]
    fn empty_batch_resolves_immediately() {
        let results: Vec<i32> = batch(Vec::new(), 2, |element: i32| {
            ComposableFuture::from_value(element)
        })
        .get()
        .expect("no failure");
        assert!(results.is_empty());
    }
}
