//! # Exchange Core: A Multi-Symbol Limit Order Book Matching Engine
//!
//! An in-memory, multi-symbol limit-order-book matching engine for an
//! electronic exchange. For each trading symbol the engine maintains a
//! two-sided book of resting orders, applies price-time priority to match
//! incoming orders against resting ones, emits a stream of events describing
//! every state transition, and supports stop and trailing-stop orders that
//! are activated by trade prices. A thin symbol-sharding layer distributes
//! non-overlapping symbol subsets across worker threads so that per-symbol
//! work remains single-threaded while the engine scales across cores.
//!
//! ## Architecture
//!
//! ```text
//! caller -> ConcurrentMarket -> worker queue (FIFO) -> BookHandler -> Book -> event sink
//! ```
//!
//! - [`book::Book`] is the per-symbol order book: six price-indexed level
//!   maps (ask/bid limit, ask/bid stop, ask/bid trailing-stop), an id index
//!   for O(1) lookup, the price-time matching algorithm, and the
//!   stop/trailing-stop activation cascade.
//! - [`book::Level`] is a FIFO of resting orders sharing a price (or stop
//!   price) and side, with O(1) insert-at-tail, pop-at-head, and
//!   remove-by-handle.
//! - [`book::Order`] is a single order's immutable identity plus its
//!   mutable execution progress.
//! - [`book::Event`] is the tagged union of state-transition notifications
//!   a book emits; [`book::EventSink`] is the trait that receives them.
//! - [`handler::BookHandler`] owns a `symbol_id -> Book` map and forwards
//!   every book's event stream to one sink; it is not thread-safe by
//!   design — SPEC_FULL.md places exactly one handler per worker thread.
//! - [`dispatcher::ConcurrentMarket`] assigns each symbol to exactly one
//!   worker at `add_symbol` time (round-robin) and forwards every
//!   subsequent operation on that symbol to the worker's task queue.
//!
//! ## Scope
//!
//! This crate covers the matching engine itself: order/level/book data
//! structures, the matching and stop-activation algorithms, the event
//! stream, and the worker-sharded dispatcher. It deliberately does not
//! include network transport, persistence/crash recovery, authentication,
//! risk checks, fee/position accounting, multi-venue routing, or
//! cross-symbol atomicity — see `DESIGN.md` for the full list of concerns
//! considered and excluded.
//!
//! ## Example
//!
//! ```
//! use exchange_core::prelude::*;
//!
//! let mut book = Book::new(1);
//! let mut sink = CollectingSink::default();
//!
//! book.add(Order::limit(1, 1, Side::Bid, 350, 200, TimeInForce::Gtc).unwrap(), &mut sink).unwrap();
//! book.add(Order::limit(2, 1, Side::Ask, 200, 500, TimeInForce::Gtc).unwrap(), &mut sink).unwrap();
//!
//! // The incoming ask trades against the resting bid at the resting price
//! // (price improvement for the taker), leaving 300 open on the ask.
//! assert_eq!(book.get(2).unwrap().open_quantity(), 300);
//! assert!(!book.contains(1));
//! ```

pub mod book;
pub mod dispatcher;
pub mod handler;
pub mod prelude;
