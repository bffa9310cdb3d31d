use crate::eager::EagerComposableFuture;
use crate::future::ComposableFuture;
use crate::scheduler::Scheduler;
use crate::try_value::Try;
use std::collections::HashMap;
use std::hash::Hash;
use std::mem;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Race<K, T> {
    collected: HashMap<K, T>,
    pending: usize,
    done: bool,
}

/// Resolve once `count` of the given futures have resolved successfully.
///
/// The aggregate resolves with exactly those `count` results, keyed by their
/// original identity, as soon as the `count`-th success arrives. Failed inputs
/// do not count toward `count` and do not by themselves fail the aggregate; if
/// every input has resolved and fewer than `count` successes exist, the
/// aggregate resolves with the successes collected so far.
///
/// Inputs still pending after resolution are left running; no cancellation is
/// propagated, and nothing observes their eventual result through the
/// aggregate.
pub fn first<K, T>(
    futures: HashMap<K, ComposableFuture<T>>,
    count: usize,
) -> ComposableFuture<HashMap<K, T>>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    let aggregate = EagerComposableFuture::new();
    race(futures, count, &aggregate);
    aggregate.into()
}

/// Like [first], but with a deadline.
///
/// If fewer than `count` successes have arrived when `timeout` elapses, the
/// aggregate resolves with whatever successes have arrived so far.
pub fn first_within<K, T, Sch>(
    futures: HashMap<K, ComposableFuture<T>>,
    count: usize,
    timeout: Duration,
    scheduler: &Sch,
) -> ComposableFuture<HashMap<K, T>>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + 'static,
    Sch: Scheduler,
{
    let aggregate = EagerComposableFuture::new();
    let state = race(futures, count, &aggregate);

    let on_timer = aggregate.clone();
    scheduler.schedule(move || Ok(()), timeout).on_resolve(move |_| {
        let expired = {
            let mut state = state.lock().unwrap();
            if state.done {
                None
            } else {
                state.done = true;
                Some(mem::take(&mut state.collected))
            }
        };
        if let Some(collected) = expired {
            on_timer.set(collected);
        }
    });

    aggregate.into()
}

fn race<K, T>(
    futures: HashMap<K, ComposableFuture<T>>,
    count: usize,
    aggregate: &EagerComposableFuture<HashMap<K, T>>,
) -> Arc<Mutex<Race<K, T>>>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    let state = Arc::new(Mutex::new(Race {
        collected: HashMap::new(),
        pending: futures.len(),
        done: false,
    }));

    if count == 0 || futures.is_empty() {
        state.lock().unwrap().done = true;
        aggregate.set(HashMap::new());
        return state;
    }

    for (key, future) in futures {
        let state = state.clone();
        let aggregate = aggregate.clone();
        future.on_resolve(move |result| {
            let finished = {
                let mut state = state.lock().unwrap();
                state.pending -= 1;
                if state.done {
                    None
                } else {
                    if let Try::Success(value) = result {
                        if state.collected.len() < count {
                            state.collected.insert(key, value);
                        }
                    }
                    if state.collected.len() == count || state.pending == 0 {
                        state.done = true;
                        Some(mem::take(&mut state.collected))
                    } else {
                        None
                    }
                }
            };
            if let Some(collected) = finished {
                aggregate.set(collected);
            }
        });
    }

    state
}
