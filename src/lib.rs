#![crate_name = "composable_futures"]
#![deny(missing_docs)]

//! # A Tiny Example
//! ```
//! use composable_futures::Scheduler;
//! use threadpool::ThreadPool;
//!
//! let pool = ThreadPool::with_name("composable-futures example".into(), 2);
//! let future = pool.submit(|| Ok(6))
//!              .continue_on_success(|x| Ok(x * 7));
//! assert_eq!(42, future.get().expect("no failure"));
//! ```
//!
//! What this does:
//! - `submit`: hands the closure to the threadpool, returning a [ComposableFuture] for its outcome.
//! - `continue_on_success`: declares a transformation to apply once that outcome is a value.
//! - `get`: blocks the calling thread until the final outcome is available.
//!
//! The continuation runs on whichever thread resolves the future, as soon as the value exists.
//!
//! # Outcomes
//! Every future resolves exactly once, to a [Try]:
//! either a `success` holding a value,
//! or a `failure` holding an [Error].
//!
//! [Try] is a value in its own right, and carries the usual transformation suite
//! ([map](Try::map), [flat_map](Try::flat_map), [recover](Try::recover), [fold](Try::fold), ...),
//! so code can manipulate outcomes without caring whether they were produced asynchronously.
//! A closure handed to any of these may itself fail, by returning [Err];
//! the failure is captured as a `failure` outcome rather than unwinding.
//! ```
//! use composable_futures::Try;
//!
//! let outcome = Try::from_value(2).map(|x| Ok(x + 1));
//! assert_eq!(Some(&3), outcome.value());
//! ```
//!
//! # Futures and Promises
//! A [ComposableFuture] is the read side: it can be observed
//! ([on_resolve](ComposableFuture::on_resolve)), chained
//! ([continue_with](ComposableFuture::continue_with) and friends), and awaited
//! ([get](ComposableFuture::get)). Clones share the same cell, so every
//! observer sees the same single resolution.
//!
//! An [EagerComposableFuture] is the write side: whoever holds it resolves
//! the future, exactly once. Later writes are no-ops.
//! ```
//! use composable_futures::EagerComposableFuture;
//!
//! let promise = EagerComposableFuture::new();
//! let future = promise.future();
//! promise.set(5);
//! assert_eq!(5, future.get().expect("no failure"));
//! ```
//!
//! # Schedulers
//! Work is placed via a [Scheduler].
//!
//! Currently, the following schedulers are implemented:
//! - [ImmediateScheduler] runs every task on the calling thread, before returning.
//! - [ThreadPool](threadpool::ThreadPool) runs tasks using a threadpool.
//!
//! Schedulers also implement [schedule](Scheduler::schedule), which delays a
//! task by a duration; [ComposableFuture::with_timeout] builds on this to
//! bound how long a future may stay unresolved.
//!
//! # Composition
//! Multiple futures can be combined into one:
//! - [all] and [all_keyed] wait for a whole collection.
//! - [combine] and [combine3] merge heterogeneous futures through a function.
//! - [first] and [first_within] resolve with the earliest successes.
//! - [batch] and [batch_unordered] push a sequence through a handler with bounded parallelism.
//! - [repeat], [recursive], and [foreach] express asynchronous loops.
//! ```
//! use composable_futures::{all, ComposableFuture};
//!
//! let futures = vec![
//!     ComposableFuture::from_value(1),
//!     ComposableFuture::from_value(2),
//!     ComposableFuture::from_value(3),
//! ];
//! let values = all(false, futures).get().expect("no failure");
//! assert_eq!(vec![1, 2, 3], values);
//! ```
//!
//! # Streams
//! A [FutureStream] is a finite push sequence of outcomes, consumed at most
//! once. [to_stream] builds a cold stream from a [FutureProvider];
//! [to_hot_stream] wraps already-running futures; [batch_to_stream] emits
//! batch results slice by slice. [blocking_iter](FutureStream::blocking_iter)
//! bridges a stream back into ordinary iterator code.
//! ```
//! use composable_futures::{to_hot_stream, ComposableFuture};
//!
//! let stream = to_hot_stream(vec![
//!     ComposableFuture::from_value("a"),
//!     ComposableFuture::from_value("b"),
//! ]);
//! let elements: Vec<&str> = stream
//!     .blocking_iter()
//!     .map(|element| element.get().expect("no failure"))
//!     .collect();
//! assert_eq!(vec!["a", "b"], elements);
//! ```

mod all;
mod batch;
mod combine;
mod eager;
mod errors;
mod first;
mod future;
mod iterate;
mod scheduler;
mod stream;
mod try_value;

pub use all::{all, all_keyed};
pub use batch::{batch, batch_to_stream, batch_unordered};
pub use combine::{combine, combine3};
pub use eager::EagerComposableFuture;
pub use errors::{new_error, Error, FutureError, Result};
pub use first::{first, first_within};
pub use future::ComposableFuture;
pub use iterate::{foreach, recursive, repeat};
pub use scheduler::{ImmediateScheduler, Scheduler};
pub use stream::{to_hot_stream, to_stream, BlockingIter, FutureProvider, FutureStream, Observer};
pub use try_value::Try;
