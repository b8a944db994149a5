//! The per-symbol limit order book: data model, matching engine, and
//! stop/trailing-stop activation.
//!
//! A [`Book`] owns every resting order for one symbol. It has no internal
//! locking — the concurrency model (see [`crate::dispatcher`]) guarantees
//! that exactly one worker thread ever touches a given book, so every
//! mutating method here takes a plain `&mut self`.

pub mod book;
pub mod error;
pub mod events;
pub mod level;
mod matching;
mod order;
mod stops;

pub use book::Book;
pub use error::{BookError, DispatchError, OrderError};
pub use events::{CollectingSink, Event, EventSink, NullSink};
pub use level::{Level, LevelHandle};
pub use order::{Order, OrderType, Side, TimeInForce};
