//! The event stream emitted by a [`Book`](crate::book::book::Book): symbol
//! lifecycle and order lifecycle notifications, plus the sink trait that
//! receives them.

use serde::{Deserialize, Serialize};

use crate::book::order::Order;

/// A single state-transition notification emitted by a book.
///
/// Events for one symbol, produced by one worker, are always observed by
/// that worker's sink in the exact order they were produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    /// A new symbol (and its empty book) was registered.
    SymbolAdded {
        /// The symbol's id.
        symbol_id: u32,
        /// The symbol's display name.
        name: String,
    },

    /// A symbol (and its book) was deregistered.
    SymbolDeleted {
        /// The symbol's id.
        symbol_id: u32,
        /// The symbol's display name.
        name: String,
    },

    /// An order was accepted into the book, before any matching was attempted.
    OrderAdded {
        /// Snapshot of the order at add time.
        order: Order,
    },

    /// An order left the book: filled, cancelled away entirely, replaced, or
    /// dropped (IOC remainder, unmatched FOK, expired market order).
    OrderDeleted {
        /// Snapshot of the order at delete time.
        order: Order,
    },

    /// An order's resting state changed without leaving the book, e.g. a
    /// partial cancel or a stop-order activation.
    OrderUpdated {
        /// Snapshot of the order after the update.
        order: Order,
    },

    /// An order was matched and (partially or fully) executed.
    OrderExecuted {
        /// Snapshot of the order after the execution, with
        /// `last_executed_price`/`last_executed_quantity` set to this trade.
        order: Order,
    },
}

/// Receives the event stream produced by a book or dispatcher.
///
/// Implement this for any sink: an in-memory collector for tests, a
/// forwarding channel, a logger, or a no-op. A blanket impl covers any
/// `Fn(&Event) + Send` closure, so callback-style sinks work unchanged.
pub trait EventSink: Send {
    /// Called once per emitted event, in emission order.
    fn on_event(&mut self, event: &Event);
}

impl<F> EventSink for F
where
    F: FnMut(&Event) + Send,
{
    fn on_event(&mut self, event: &Event) {
        self(event)
    }
}

/// An [`EventSink`] that discards every event. Useful as a default when the
/// caller has no interest in the stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _event: &Event) {}
}

/// An [`EventSink`] that appends every event to an in-memory buffer, for
/// tests and simple embeddings.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Events observed so far, in emission order.
    pub events: Vec<Event>,
}

impl EventSink for CollectingSink {
    fn on_event(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}
