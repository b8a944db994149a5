//! Error types for order construction and book operations.

use std::fmt;

use crate::book::order::OrderType;

/// Errors raised while constructing an [`Order`](crate::book::order::Order).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OrderError {
    /// Order id must be positive.
    NonPositiveId {
        /// The rejected id.
        id: u64,
    },

    /// Symbol id must be positive.
    NonPositiveSymbolId {
        /// The rejected symbol id.
        symbol_id: u32,
    },

    /// Order quantity must be positive.
    NonPositiveQuantity {
        /// The rejected quantity.
        quantity: u64,
    },

    /// Limit-priced order types require a positive price.
    NonPositivePrice {
        /// The rejected price.
        price: u64,
    },

    /// Stop variants require a positive stop price.
    NonPositiveStopPrice {
        /// The rejected stop price.
        stop_price: u64,
    },

    /// Trailing-stop variants require a positive trail amount.
    NonPositiveTrailAmount {
        /// The rejected trail amount.
        trail_amount: u64,
    },

    /// Market, Stop, and TrailingStop orders cannot be GTC.
    GtcNotAllowed {
        /// The order type that rejected GTC.
        order_type: OrderType,
    },
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::NonPositiveId { id } => write!(f, "order id must be positive, got {id}"),
            OrderError::NonPositiveSymbolId { symbol_id } => {
                write!(f, "symbol id must be positive, got {symbol_id}")
            }
            OrderError::NonPositiveQuantity { quantity } => {
                write!(f, "order quantity must be positive, got {quantity}")
            }
            OrderError::NonPositivePrice { price } => {
                write!(f, "order price must be positive, got {price}")
            }
            OrderError::NonPositiveStopPrice { stop_price } => {
                write!(f, "stop price must be positive, got {stop_price}")
            }
            OrderError::NonPositiveTrailAmount { trail_amount } => {
                write!(f, "trail amount must be positive, got {trail_amount}")
            }
            OrderError::GtcNotAllowed { order_type } => {
                write!(f, "{order_type} orders cannot have GTC time in force")
            }
        }
    }
}

impl std::error::Error for OrderError {}

/// Errors raised by operations against a [`Book`](crate::book::book::Book).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BookError {
    /// No resting order with this id exists in the book.
    UnknownOrder {
        /// The id that was looked up.
        order_id: u64,
    },

    /// An order with this id is already present in the book.
    DuplicateOrderId {
        /// The id that collided.
        order_id: u64,
    },

    /// A cancel/execute quantity must be positive.
    ZeroQuantity,

    /// A cancel/execute quantity exceeded the order's open quantity.
    QuantityExceedsOpen {
        /// The requested quantity.
        requested: u64,
        /// The quantity actually available.
        available: u64,
    },

    /// An execute price must be positive.
    NonPositivePrice,
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::UnknownOrder { order_id } => write!(f, "unknown order id {order_id}"),
            BookError::DuplicateOrderId { order_id } => {
                write!(f, "order id {order_id} already exists in this book")
            }
            BookError::ZeroQuantity => write!(f, "quantity must be positive"),
            BookError::QuantityExceedsOpen { requested, available } => {
                write!(f, "requested quantity {requested} exceeds open quantity {available}")
            }
            BookError::NonPositivePrice => write!(f, "execution price must be positive"),
        }
    }
}

impl std::error::Error for BookError {}

/// Errors raised by the symbol-sharded dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DispatchError {
    /// No book is registered for this symbol.
    UnknownSymbol {
        /// The symbol id that was looked up.
        symbol_id: u32,
    },

    /// A symbol with this id is already registered.
    DuplicateSymbol {
        /// The symbol id that collided.
        symbol_id: u32,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownSymbol { symbol_id } => write!(f, "unknown symbol id {symbol_id}"),
            DispatchError::DuplicateSymbol { symbol_id } => {
                write!(f, "symbol id {symbol_id} already registered")
            }
        }
    }
}

impl std::error::Error for DispatchError {}
