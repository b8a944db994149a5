//! A single worker thread: one FIFO task queue, one [`BookHandler`], drained
//! until shutdown.
//!
//! Grounded in `original_source/include/concurrent/thread_pool.h`'s
//! `ThreadPool::workerThread`, but waiting on a blocking channel receive
//! instead of a `tryPop` + `yield` busy loop (SPEC_FULL.md §4.6 calls for a
//! condition-variable wait, which `crossbeam::channel`'s blocking `recv`
//! gives for free).

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use tracing::info;

use crate::book::EventSink;
use crate::handler::BookHandler;

/// A unit of work a worker applies to its `BookHandler`, capturing whatever
/// arguments it needs by value (SPEC_FULL.md §4.6: "a nullary callable that
/// captures the BookHandler pointer and argument payload by value").
pub(crate) type Task<S> = Box<dyn FnOnce(&mut BookHandler<S>) + Send + 'static>;

/// One OS thread owning exactly one [`BookHandler`] and draining exactly one
/// task queue, per SPEC_FULL.md §2 item 6.
pub(crate) struct Worker<S: EventSink + 'static> {
    sender: Option<Sender<Task<S>>>,
    handle: Option<JoinHandle<()>>,
}

impl<S: EventSink + 'static> Worker<S> {
    /// Spawns the worker thread, naming it `book-worker-{index}` for easier
    /// diagnosis under a debugger or profiler.
    pub(crate) fn spawn(index: usize, sink: S) -> Self {
        let (sender, receiver) = channel::unbounded::<Task<S>>();
        let handle = thread::Builder::new()
            .name(format!("book-worker-{index}"))
            .spawn(move || {
                info!(worker_index = index, "book worker started");
                let mut handler = BookHandler::new(sink);
                while let Ok(task) = receiver.recv() {
                    task(&mut handler);
                }
                info!(worker_index = index, "book worker drained its queue and is shutting down");
            })
            .expect("failed to spawn book worker thread");
        Worker {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// Enqueues `task`. Silently dropped if the worker has already begun
    /// shutting down (its receiver end gone).
    pub(crate) fn submit(&self, task: Task<S>) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(task);
        }
    }
}

impl<S: EventSink + 'static> Drop for Worker<S> {
    /// Closes the task channel first (dropping the `Sender` makes `recv`
    /// return once the queue drains) and only then joins the thread, so the
    /// worker is guaranteed to finish every already-queued task before this
    /// returns — SPEC_FULL.md §4.6's mandatory join-after-drain.
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
