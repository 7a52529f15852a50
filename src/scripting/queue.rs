//! Single-consumer work queue with a lazily started, persistent worker
//!
//! Producers on any thread append items; one worker thread drains them in
//! arrival order, one at a time. The worker starts on the first item and
//! stays alive until the queue is shut down.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Processes items on the worker thread
///
/// `queue_started` and `queue_complete` run with the queue locked, so they
/// strictly alternate. They must not call back into the queue.
pub trait Consumer<T>: Send + Sync + 'static {
    fn consume(&self, item: T);

    /// Called when an accepted item makes an idle queue busy
    fn queue_started(&self) {}

    /// Called once each time the worker drains the backlog
    fn queue_complete(&self) {}
}

struct State<T> {
    items: VecDeque<T>,
    started: bool,
    busy: bool,
    shutdown: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    available: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct WorkQueue<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    consumer: Arc<dyn Consumer<T>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    name: String,
}

impl<T: Send + 'static> WorkQueue<T> {
    pub fn new(name: impl Into<String>, consumer: Arc<dyn Consumer<T>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    items: VecDeque::new(),
                    started: false,
                    busy: false,
                    shutdown: false,
                }),
                available: Condvar::new(),
            }),
            consumer,
            worker: Mutex::new(None),
            name: name.into(),
        }
    }

    /// True from the moment an item is accepted until the worker has
    /// finished it and finds nothing else queued
    pub fn consumer_busy(&self) -> bool {
        self.shared.lock().busy
    }

    /// Append an item. Never blocks on the consumer.
    ///
    /// Rejected (returns `false`, queue untouched) when the worker is busy
    /// and `allow_queuing` is off, after shutdown, or if the worker thread
    /// cannot be started.
    pub fn produce(&self, item: T, allow_queuing: bool) -> bool {
        let mut state = self.shared.lock();
        if state.shutdown {
            tracing::debug!(queue = %self.name, "rejected: queue shut down");
            return false;
        }
        if state.busy && !allow_queuing {
            tracing::debug!(queue = %self.name, "rejected: consumer busy");
            return false;
        }

        if !state.started {
            match self.start_consumer() {
                Ok(handle) => {
                    state.started = true;
                    *self.worker.lock().unwrap_or_else(|p| p.into_inner()) = Some(handle);
                }
                Err(err) => {
                    tracing::error!(queue = %self.name, %err, "failed to start consumer thread");
                    return false;
                }
            }
        }

        state.items.push_back(item);
        if !state.busy {
            state.busy = true;
            self.consumer.queue_started();
        }
        tracing::debug!(queue = %self.name, pending = state.items.len(), "item queued");
        self.shared.available.notify_one();
        true
    }

    fn start_consumer(&self) -> std::io::Result<JoinHandle<()>> {
        let shared = Arc::clone(&self.shared);
        let consumer = Arc::clone(&self.consumer);
        let name = self.name.clone();
        thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || run_consumer(&name, &shared, consumer.as_ref()))
    }

    /// Stop accepting items and drop those not yet started. The worker
    /// exits once its current item is done.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        if state.shutdown {
            return;
        }
        state.shutdown = true;
        let dropped = state.items.len();
        state.items.clear();
        if dropped > 0 {
            tracing::debug!(queue = %self.name, dropped, "discarding queued items");
        }
        self.shared.available.notify_all();
    }

    /// Wait for the worker thread to exit. Only returns once the queue has
    /// been closed and the current item has finished.
    pub fn join(&self) {
        let handle = self.worker.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::error!(queue = %self.name, "consumer thread panicked");
            }
        }
    }

    /// Stop the worker after its current item. Items not yet started are
    /// dropped.
    pub fn shutdown(&self) {
        self.close();
        self.join();
    }
}

impl<T: Send + 'static> Drop for WorkQueue<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_consumer<T: Send + 'static>(name: &str, shared: &Shared<T>, consumer: &dyn Consumer<T>) {
    tracing::debug!(queue = %name, "consumer started");
    loop {
        let item = {
            let mut state = shared.lock();
            loop {
                if state.shutdown {
                    tracing::debug!(queue = %name, "consumer stopped");
                    return;
                }
                if let Some(item) = state.items.pop_front() {
                    break item;
                }
                state = shared
                    .available
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
        };

        // A panicking item must not take the worker down with it
        if catch_unwind(AssertUnwindSafe(|| consumer.consume(item))).is_err() {
            tracing::error!(queue = %name, "consumer panicked; continuing with next item");
        }

        let mut state = shared.lock();
        if state.items.is_empty() && state.busy {
            state.busy = false;
            consumer.queue_complete();
        }
    }
}
