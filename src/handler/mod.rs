//! `BookHandler`: owns every [`Book`] for a set of symbols and forwards their
//! event streams to a single sink.
//!
//! A `BookHandler` has no concurrency control of its own — SPEC_FULL.md
//! §4.4 places exactly one handler per worker thread (see
//! [`crate::dispatcher::worker`]), so `symbol_id -> Book` lookup and mutation
//! is a plain `HashMap` access.

use std::collections::HashMap;
use std::fmt;

use tracing::{info, warn};

use crate::book::{Book, BookError, DispatchError, Event, EventSink};

/// Errors raised by a [`BookHandler`] operation: either the symbol itself is
/// unrecognized (a [`DispatchError`], per SPEC_FULL.md §7's dispatcher-level
/// error taxonomy), or the underlying book rejected the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HandlerError {
    /// No book is registered for this symbol.
    Dispatch(DispatchError),
    /// The book rejected the operation; see the wrapped [`BookError`].
    Book(BookError),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Dispatch(err) => write!(f, "{err}"),
            HandlerError::Book(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for HandlerError {}

impl From<BookError> for HandlerError {
    fn from(err: BookError) -> Self {
        HandlerError::Book(err)
    }
}

impl From<DispatchError> for HandlerError {
    fn from(err: DispatchError) -> Self {
        HandlerError::Dispatch(err)
    }
}

/// Owns a collection of [`Book`]s keyed by symbol id and one [`EventSink`].
///
/// Mirrors the teacher's `BookManagerStd`/`BookManagerTokio` shape (a
/// `symbol -> book` map plus one event-routing channel), generalized from
/// per-book trade listeners to a single sink shared by every book this
/// handler owns, per SPEC_FULL.md §4.4.
pub struct BookHandler<S: EventSink> {
    books: HashMap<u32, Book>,
    sink: S,
}

impl<S: EventSink> BookHandler<S> {
    /// A handler with no books yet, forwarding events to `sink`.
    pub fn new(sink: S) -> Self {
        BookHandler { books: HashMap::new(), sink }
    }

    /// Number of books this handler currently owns.
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// True if a book for `symbol_id` is registered.
    pub fn has_book(&self, symbol_id: u32) -> bool {
        self.books.contains_key(&symbol_id)
    }

    /// Read-only access to a symbol's book.
    pub fn book(&self, symbol_id: u32) -> Option<&Book> {
        self.books.get(&symbol_id)
    }

    /// Registers a new book for `symbol_id` and emits `SymbolAdded`. A no-op
    /// (besides re-emitting nothing) if the symbol is already registered.
    pub fn add_book(&mut self, symbol_id: u32, name: &str) {
        if self.books.contains_key(&symbol_id) {
            return;
        }
        info!(symbol_id, name, "add_symbol");
        self.sink.on_event(&Event::SymbolAdded { symbol_id, name: name.to_string() });
        self.books.insert(symbol_id, Book::new(symbol_id));
    }

    /// Deregisters `symbol_id`'s book (and every resting order in it,
    /// silently) and emits `SymbolDeleted`. A no-op if unregistered.
    pub fn delete_book(&mut self, symbol_id: u32, name: &str) {
        if self.books.remove(&symbol_id).is_none() {
            return;
        }
        info!(symbol_id, name, "delete_symbol");
        self.sink.on_event(&Event::SymbolDeleted { symbol_id, name: name.to_string() });
    }

    /// Forwards [`Book::add`] to `symbol_id`'s book.
    pub fn add_order(&mut self, symbol_id: u32, order: crate::book::Order) -> Result<(), HandlerError> {
        self.with_book(symbol_id, |book, sink| book.add(order, sink))
    }

    /// Forwards [`Book::delete`] to `symbol_id`'s book.
    pub fn delete_order(&mut self, symbol_id: u32, order_id: u64) -> Result<(), HandlerError> {
        self.with_book(symbol_id, |book, sink| book.delete(order_id, sink))
    }

    /// Forwards [`Book::cancel`] to `symbol_id`'s book.
    pub fn cancel_order(&mut self, symbol_id: u32, order_id: u64, quantity: u64) -> Result<(), HandlerError> {
        self.with_book(symbol_id, |book, sink| book.cancel(order_id, quantity, sink))
    }

    /// Forwards [`Book::replace`] to `symbol_id`'s book.
    pub fn replace_order(&mut self, symbol_id: u32, order_id: u64, new_order_id: u64, new_price: u64) -> Result<(), HandlerError> {
        self.with_book(symbol_id, |book, sink| book.replace(order_id, new_order_id, new_price, sink))
    }

    /// Forwards [`Book::execute`] to `symbol_id`'s book.
    pub fn execute_order(&mut self, symbol_id: u32, order_id: u64, quantity: u64, price: Option<u64>) -> Result<(), HandlerError> {
        self.with_book(symbol_id, |book, sink| book.execute(order_id, quantity, price, sink))
    }

    fn with_book<R>(
        &mut self,
        symbol_id: u32,
        f: impl FnOnce(&mut Book, &mut dyn EventSink) -> Result<R, BookError>,
    ) -> Result<R, HandlerError> {
        let Some(book) = self.books.get_mut(&symbol_id) else {
            warn!(symbol_id, "operation rejected: unknown symbol");
            return Err(DispatchError::UnknownSymbol { symbol_id }.into());
        };
        Ok(f(book, &mut self.sink)?)
    }
}
