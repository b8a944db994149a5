//! Prelude module that re-exports the commonly used types and traits.
//!
//! This module provides a convenient way to import the most commonly used
//! types from the crate. Instead of importing each type individually, use:
//!
//! ```
//! use exchange_core::prelude::*;
//! ```

// Order data model
pub use crate::book::{Order, OrderType, Side, TimeInForce};

// The order book itself
pub use crate::book::Book;

// Level container (rarely constructed directly, but useful for inspection)
pub use crate::book::{Level, LevelHandle};

// Errors
pub use crate::book::{BookError, DispatchError, OrderError};

// Events and sinks
pub use crate::book::{CollectingSink, Event, EventSink, NullSink};

// Per-symbol dispatch
pub use crate::handler::{BookHandler, HandlerError};

// The symbol-sharded dispatcher
pub use crate::dispatcher::ConcurrentMarket;
