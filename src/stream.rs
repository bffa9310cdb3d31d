use crate::future::ComposableFuture;
use crate::try_value::Try;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

/// Pull-style source of futures, consumed by [to_stream].
///
/// The pump calls [FutureProvider::move_next] to advance, and
/// [FutureProvider::current] to obtain the future at the new position.
/// `current` is only called after `move_next` returned true.
pub trait FutureProvider<T> {
    /// Advance to the next future.
    /// Returns false once the provider is exhausted.
    fn move_next(&mut self) -> bool;
    /// The future at the current position.
    fn current(&self) -> ComposableFuture<T>;
}

/// Receiver side of a [FutureStream].
pub trait Observer<T>: Send {
    /// Invoked once per stream element, in emission order.
    fn on_next(&mut self, element: Try<T>);
    /// Invoked once, after the final element.
    /// No further invocations happen after this.
    fn on_complete(&mut self);
}

/// A finite, non-restartable push sequence of [Try] elements.
///
/// The stream is inert until consumed via [FutureStream::subscribe] or
/// [FutureStream::blocking_iter], and can be consumed at most once. Elements
/// are delivered one at a time, never concurrently, and `on_complete` is
/// delivered exactly once after the final element.
pub struct FutureStream<T> {
    start: Box<dyn FnOnce(Box<dyn Observer<T>>) + Send>,
}

impl<T> FutureStream<T> {
    pub(crate) fn new(start: impl FnOnce(Box<dyn Observer<T>>) + Send + 'static) -> Self {
        FutureStream {
            start: Box::new(start),
        }
    }

    /// Attach an observer and start consumption.
    pub fn subscribe(self, observer: impl Observer<T> + 'static) {
        (self.start)(Box::new(observer));
    }

    /// Consume the stream as a blocking iterator.
    ///
    /// Each call to [Iterator::next] blocks until the next element is
    /// emitted, and returns [None] once the stream completed.
    pub fn blocking_iter(self) -> BlockingIter<T>
    where
        T: Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        self.subscribe(ChannelObserver {
            sender: Some(sender),
        });
        BlockingIter { receiver }
    }
}

/// Blocking iterator over a [FutureStream], created by
/// [FutureStream::blocking_iter].
pub struct BlockingIter<T> {
    receiver: mpsc::Receiver<Try<T>>,
}

impl<T> Iterator for BlockingIter<T> {
    type Item = Try<T>;

    fn next(&mut self) -> Option<Try<T>> {
        self.receiver.recv().ok()
    }
}

struct ChannelObserver<T> {
    sender: Option<mpsc::Sender<Try<T>>>,
}

impl<T: Send> Observer<T> for ChannelObserver<T> {
    fn on_next(&mut self, element: Try<T>) {
        if let Some(sender) = &self.sender {
            // A dropped iterator just discards the rest of the stream.
            let _ = sender.send(element);
        }
    }

    fn on_complete(&mut self) {
        self.sender = None;
    }
}

/// Turn a [FutureProvider] into a cold stream.
///
/// The provider is not advanced until the stream is consumed; each element
/// is awaited before the provider is asked for the next one.
pub fn to_stream<T, P>(provider: P) -> FutureStream<T>
where
    T: Clone + Send + 'static,
    P: FutureProvider<T> + Send + 'static,
{
    FutureStream::new(move |observer| pump(provider, observer))
}

fn pump<T, P>(mut provider: P, mut observer: Box<dyn Observer<T>>)
where
    T: Clone + Send + 'static,
    P: FutureProvider<T> + Send + 'static,
{
    if provider.move_next() {
        provider.current().on_resolve(move |result| {
            observer.on_next(result);
            pump(provider, observer);
        });
    } else {
        observer.on_complete();
    }
}

struct HotState<T> {
    queue: VecDeque<Try<T>>,
    remaining: usize,
    observer: Option<Box<dyn Observer<T>>>,
    emitting: bool,
}

/// Turn a set of already-running futures into a hot stream.
///
/// Resolutions are observed immediately and buffered, so elements resolved
/// before subscription are not lost; they are replayed to the observer in
/// completion order, followed by whatever resolves later. The stream
/// completes once every input future resolved.
pub fn to_hot_stream<T>(futures: Vec<ComposableFuture<T>>) -> FutureStream<T>
where
    T: Clone + Send + 'static,
{
    let state = Arc::new(Mutex::new(HotState {
        queue: VecDeque::new(),
        remaining: futures.len(),
        observer: None,
        emitting: false,
    }));

    for future in &futures {
        let state = state.clone();
        future.on_resolve(move |result| {
            {
                let mut guard = state.lock().unwrap();
                guard.queue.push_back(result);
                guard.remaining -= 1;
            }
            drain(&state);
        });
    }

    FutureStream::new(move |observer| {
        state.lock().unwrap().observer = Some(observer);
        drain(&state);
    })
}

/// Deliver buffered elements to the attached observer.
///
/// The `emitting` flag keeps delivery single-threaded: a resolution arriving
/// while another thread is inside `on_next` queues up and is delivered by
/// that thread's next loop round.
fn drain<T>(state: &Arc<Mutex<HotState<T>>>) {
    loop {
        let mut guard = state.lock().unwrap();
        if guard.emitting || guard.observer.is_none() {
            return;
        }
        if let Some(element) = guard.queue.pop_front() {
            let mut observer = guard.observer.take().expect("observer is attached");
            guard.emitting = true;
            drop(guard);
            observer.on_next(element);
            let mut guard = state.lock().unwrap();
            guard.observer = Some(observer);
            guard.emitting = false;
        } else if guard.remaining == 0 {
            let mut observer = guard.observer.take().expect("observer is attached");
            drop(guard);
            observer.on_complete();
            return;
        } else {
            return;
        }
    }
}
