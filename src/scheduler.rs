use crate::eager::EagerComposableFuture;
use crate::errors::{new_error, Result};
use crate::future::ComposableFuture;
use crate::try_value::Try;
use std::thread;
use std::time::Duration;
use threadpool::ThreadPool;

/// Schedulers are things that can do work.
///
/// The future core imposes no thread pool of its own: a computation is turned
/// into a [ComposableFuture] by handing it to a scheduler, and continuations
/// run on whichever thread performs the resolution. Pass the scheduler
/// explicitly where it is needed; there is no ambient process-wide instance.
///
/// A scheduler must report computation errors as a resolved failure, never by
/// panicking out of [submit](Scheduler::submit)/[schedule](Scheduler::schedule)
/// itself. That contract is already met by handing the task outcome to
/// [Try::apply].
///
/// Currently, the following schedulers are implemented:
/// - [ImmediateScheduler] runs every task immediately, on the calling thread.
/// - [ThreadPool](threadpool::ThreadPool) runs tasks using a threadpool.
///
/// # Example
/// ```
/// use composable_futures::Scheduler;
/// use threadpool::ThreadPool;
///
/// let pool = ThreadPool::with_name("example".into(), 1);
/// let future = pool.submit(|| {
///     let mut s = 0_i32;
///     for n in 1..101 {
///         s += n;
///     }
///     Ok(s)
/// });
/// assert_eq!(Ok(5050), future.get().map_err(|e| e.to_string()));
/// ```
pub trait Scheduler: Clone {
    /// Mark if the scheduler may block the caller, when work is submitted.
    /// If this is `false`, you are guaranteed that `submit` and `schedule`
    /// return before the task completes.
    /// But if it returns `true`, the task completes before `submit`/`schedule`
    /// return.
    const EXECUTION_BLOCKS_CALLER: bool;

    /// Run the task, and return a future that resolves with its outcome.
    fn submit<T, F>(&self, task: F) -> ComposableFuture<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static;

    /// Run the task after the given delay, and return a future that resolves
    /// with its outcome.
    fn schedule<T, F>(&self, task: F, delay: Duration) -> ComposableFuture<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static;
}

/// An immediate-scheduler is a [Scheduler] which runs any tasks on it immediately.
///
/// [schedule](Scheduler::schedule) sleeps on the calling thread for the delay.
/// Useful for tests and for code that is indifferent to where it runs.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct ImmediateScheduler {}

impl Scheduler for ImmediateScheduler {
    const EXECUTION_BLOCKS_CALLER: bool = true;

    fn submit<T, F>(&self, task: F) -> ComposableFuture<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        ComposableFuture::from_try(Try::apply(task))
    }

    fn schedule<T, F>(&self, task: F, delay: Duration) -> ComposableFuture<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        thread::sleep(delay);
        self.submit(task)
    }
}

impl Scheduler for ThreadPool {
    const EXECUTION_BLOCKS_CALLER: bool = false;

    fn submit<T, F>(&self, task: F) -> ComposableFuture<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let promise = EagerComposableFuture::new();
        let completion = promise.clone();
        self.execute(move || {
            completion.complete(Try::apply(task));
        });
        promise.into()
    }

    fn schedule<T, F>(&self, task: F, delay: Duration) -> ComposableFuture<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let promise = EagerComposableFuture::new();
        let completion = promise.clone();
        let pool = self.clone();
        // The delay runs on a dedicated thread, so a saturated pool cannot
        // push the timer back; only the task itself queues on the pool.
        let timer = thread::Builder::new()
            .name("composable-futures-delay".into())
            .spawn(move || {
                thread::sleep(delay);
                pool.execute(move || {
                    completion.complete(Try::apply(task));
                });
            });
        if let Err(error) = timer {
            promise.set_error(new_error(error));
        }
        promise.into()
    }
}
