//! `ConcurrentMarket`: the symbol-sharded dispatcher in front of the worker
//! pool.
//!
//! Grounded in `original_source/include/matching/concurrent_market.h` and
//! its `.cpp`: one book-and-queue-id map per symbol, a monotonic
//! round-robin counter handed out at `addSymbol` time, and every other
//! operation submitted as a task to the symbol's queue. The C++ source
//! looks up the book itself and captures a raw pointer into the task
//! closure; this crate instead submits a task that calls back into the
//! owning `BookHandler` by symbol id, since the handler (not the caller) is
//! what actually owns each `Book`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tracing::trace;

use crate::book::{EventSink, Order};
use crate::dispatcher::worker::Worker;
use crate::handler::BookHandler;

/// Assigns each symbol to exactly one worker thread and forwards every
/// subsequent operation on that symbol to the worker's FIFO task queue.
///
/// Construction takes one [`EventSink`] per worker (SPEC_FULL.md §4.5): the
/// dispatcher builds one [`BookHandler`] and spawns one worker thread per
/// sink. Every operation is fire-and-forget — it enqueues a task and
/// returns immediately with no result, matching SPEC_FULL.md §6's
/// void-returning external interface.
pub struct ConcurrentMarket<S: EventSink + 'static> {
    workers: Vec<Worker<S>>,
    routing: Arc<RwLock<HashMap<u32, usize>>>,
    next_worker: AtomicUsize,
    running: Arc<AtomicBool>,
}

impl<S: EventSink + 'static> ConcurrentMarket<S> {
    /// Builds a dispatcher with one worker thread per sink in `sinks`.
    ///
    /// # Panics
    /// Panics if `sinks` is empty: SPEC_FULL.md §6 requires a positive
    /// worker count.
    pub fn new(sinks: Vec<S>) -> Self {
        assert!(!sinks.is_empty(), "ConcurrentMarket requires at least one worker");
        let workers = sinks.into_iter().enumerate().map(|(index, sink)| Worker::spawn(index, sink)).collect();
        ConcurrentMarket {
            workers,
            routing: Arc::new(RwLock::new(HashMap::new())),
            next_worker: AtomicUsize::new(0),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Number of worker threads backing this dispatcher.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// `false` once [`shutdown`](Self::shutdown) has run.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The worker index `symbol_id` is routed to, if it has been added.
    /// Exposed for tests asserting the round-robin assignment.
    pub fn worker_for(&self, symbol_id: u32) -> Option<usize> {
        self.routing.read().expect("routing lock poisoned").get(&symbol_id).copied()
    }

    /// Registers `symbol_id`, assigning it to the next worker in round-robin
    /// order and submitting `addBook` to that worker. A no-op if the symbol
    /// is already registered.
    pub fn add_symbol(&self, symbol_id: u32, name: impl Into<String>) {
        let name = name.into();
        trace!(symbol_id, name, "dispatch add_symbol");
        let worker_index = {
            let mut routing = self.routing.write().expect("routing lock poisoned");
            if routing.contains_key(&symbol_id) {
                return;
            }
            let worker_index = self.next_worker.fetch_add(1, Ordering::SeqCst) % self.workers.len();
            routing.insert(symbol_id, worker_index);
            worker_index
        };
        self.workers[worker_index].submit(Box::new(move |handler| handler.add_book(symbol_id, &name)));
    }

    /// Deregisters `symbol_id`: its book, and every resting order in it, are
    /// dropped silently (no per-order events). A no-op if unregistered.
    pub fn delete_symbol(&self, symbol_id: u32, name: impl Into<String>) {
        let name = name.into();
        trace!(symbol_id, name, "dispatch delete_symbol");
        let worker_index = self.routing.write().expect("routing lock poisoned").remove(&symbol_id);
        let Some(worker_index) = worker_index else { return };
        self.workers[worker_index].submit(Box::new(move |handler| handler.delete_book(symbol_id, &name)));
    }

    /// Submits a new order to its symbol's worker.
    pub fn add_order(&self, order: Order) {
        let symbol_id = order.symbol_id();
        trace!(symbol_id, order_id = order.id(), "dispatch add_order");
        self.dispatch(symbol_id, move |handler| {
            let _ = handler.add_order(symbol_id, order);
        });
    }

    /// Submits a delete of `order_id` to `symbol_id`'s worker.
    pub fn delete_order(&self, symbol_id: u32, order_id: u64) {
        trace!(symbol_id, order_id, "dispatch delete_order");
        self.dispatch(symbol_id, move |handler| {
            let _ = handler.delete_order(symbol_id, order_id);
        });
    }

    /// Submits a cancel of `quantity` off `order_id` to `symbol_id`'s worker.
    pub fn cancel_order(&self, symbol_id: u32, order_id: u64, quantity: u64) {
        trace!(symbol_id, order_id, quantity, "dispatch cancel_order");
        self.dispatch(symbol_id, move |handler| {
            let _ = handler.cancel_order(symbol_id, order_id, quantity);
        });
    }

    /// Submits a replace of `order_id` with `new_order_id`/`new_price` to
    /// `symbol_id`'s worker.
    pub fn replace_order(&self, symbol_id: u32, order_id: u64, new_order_id: u64, new_price: u64) {
        trace!(symbol_id, order_id, new_order_id, new_price, "dispatch replace_order");
        self.dispatch(symbol_id, move |handler| {
            let _ = handler.replace_order(symbol_id, order_id, new_order_id, new_price);
        });
    }

    /// Submits an execution of `quantity` of `order_id` to `symbol_id`'s
    /// worker, at `price` if given or the order's own resting price
    /// otherwise.
    pub fn execute_order(&self, symbol_id: u32, order_id: u64, quantity: u64, price: Option<u64>) {
        trace!(symbol_id, order_id, quantity, ?price, "dispatch execute_order");
        self.dispatch(symbol_id, move |handler| {
            let _ = handler.execute_order(symbol_id, order_id, quantity, price);
        });
    }

    /// Looks up `symbol_id`'s worker under the routing map's read lock —
    /// held only across the lookup and the enqueue, never across the task's
    /// execution (SPEC_FULL.md §5) — and submits `task` to it. Silently
    /// dropped if the symbol is unregistered.
    fn dispatch(&self, symbol_id: u32, task: impl FnOnce(&mut BookHandler<S>) + Send + 'static) {
        let worker_index = {
            let routing = self.routing.read().expect("routing lock poisoned");
            routing.get(&symbol_id).copied()
        };
        let Some(worker_index) = worker_index else { return };
        self.workers[worker_index].submit(Box::new(task));
    }

    /// Stops the dispatcher: every worker drains its queue and its thread is
    /// joined before this returns. Idempotent; also run implicitly on drop.
    pub fn shutdown(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.workers.clear();
    }
}

impl<S: EventSink + 'static> Drop for ConcurrentMarket<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
