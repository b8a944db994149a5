//! Order representation: type/side/time-in-force tags and the mutable
//! execution state tracked for a single resting or incoming order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::book::error::OrderError;

/// The action an order represents once it reaches the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Rests at a fixed price until filled or cancelled.
    Limit,
    /// Executes immediately against the best available price(s); never rests.
    Market,
    /// Converts to a `Market` order once the market trades through `stop_price`.
    Stop,
    /// Converts to a `Limit` order once the market trades through `stop_price`.
    StopLimit,
    /// Like `Stop`, but `stop_price` follows the market by a fixed trail.
    TrailingStop,
    /// Like `StopLimit`, but `stop_price` follows the market by a fixed trail.
    TrailingStopLimit,
}

impl OrderType {
    fn is_stop_variant(self) -> bool {
        matches!(
            self,
            OrderType::Stop | OrderType::StopLimit | OrderType::TrailingStop | OrderType::TrailingStopLimit
        )
    }

    fn is_trailing(self) -> bool {
        matches!(self, OrderType::TrailingStop | OrderType::TrailingStopLimit)
    }

    fn is_limit_priced(self) -> bool {
        matches!(self, OrderType::Limit | OrderType::StopLimit | OrderType::TrailingStopLimit)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
            OrderType::Stop => "STOP",
            OrderType::StopLimit => "STOP LIMIT",
            OrderType::TrailingStop => "TRAILING STOP",
            OrderType::TrailingStopLimit => "TRAILING STOP LIMIT",
        };
        write!(f, "{s}")
    }
}

/// How long an order remains eligible to trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till cancelled: rests until explicitly removed.
    Gtc,
    /// Fill or kill: must execute in full immediately, or is cancelled entirely.
    Fok,
    /// Immediate or cancel: executes what it can immediately, rest is dropped.
    Ioc,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Fok => "FOK",
            TimeInForce::Ioc => "IOC",
        };
        write!(f, "{s}")
    }
}

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side.
    Bid,
    /// Sell side.
    Ask,
}

impl Side {
    /// The opposite side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Bid => "BID",
            Side::Ask => "ASK",
        };
        write!(f, "{s}")
    }
}

/// A single order and its execution progress.
///
/// `quantity` is the order's current total size; `open_quantity` is always
/// `quantity - executed_quantity`. Cancelling an order reduces `quantity`
/// directly (see [`Order::reduce_quantity`]) rather than `open_quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: u64,
    symbol_id: u32,
    order_type: OrderType,
    side: Side,
    time_in_force: TimeInForce,
    price: u64,
    stop_price: u64,
    trail_amount: u64,
    quantity: u64,
    executed_quantity: u64,
    open_quantity: u64,
    last_executed_price: u64,
    last_executed_quantity: u64,
}

impl Eq for Order {}

impl Order {
    #[allow(clippy::too_many_arguments)]
    fn new(
        id: u64,
        symbol_id: u32,
        order_type: OrderType,
        side: Side,
        time_in_force: TimeInForce,
        price: u64,
        stop_price: u64,
        trail_amount: u64,
        quantity: u64,
    ) -> Result<Self, OrderError> {
        if id == 0 {
            return Err(OrderError::NonPositiveId { id });
        }
        if symbol_id == 0 {
            return Err(OrderError::NonPositiveSymbolId { symbol_id });
        }
        if quantity == 0 {
            return Err(OrderError::NonPositiveQuantity { quantity });
        }
        if matches!(order_type, OrderType::Market | OrderType::Stop | OrderType::TrailingStop)
            && matches!(time_in_force, TimeInForce::Gtc)
        {
            return Err(OrderError::GtcNotAllowed { order_type });
        }
        if order_type.is_limit_priced() && price == 0 {
            return Err(OrderError::NonPositivePrice { price });
        }
        if order_type.is_stop_variant() && stop_price == 0 {
            return Err(OrderError::NonPositiveStopPrice { stop_price });
        }
        if order_type.is_trailing() && trail_amount == 0 {
            return Err(OrderError::NonPositiveTrailAmount { trail_amount });
        }
        Ok(Order {
            id,
            symbol_id,
            order_type,
            side,
            time_in_force,
            price,
            stop_price,
            trail_amount,
            quantity,
            executed_quantity: 0,
            open_quantity: quantity,
            last_executed_price: 0,
            last_executed_quantity: 0,
        })
    }

    /// A market order: executes immediately, never rests, must be IOC or FOK.
    pub fn market(id: u64, symbol_id: u32, side: Side, quantity: u64, time_in_force: TimeInForce) -> Result<Self, OrderError> {
        Self::new(id, symbol_id, OrderType::Market, side, time_in_force, 0, 0, 0, quantity)
    }

    /// A limit order: rests at `price` until filled or cancelled.
    pub fn limit(
        id: u64,
        symbol_id: u32,
        side: Side,
        price: u64,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Result<Self, OrderError> {
        Self::new(id, symbol_id, OrderType::Limit, side, time_in_force, price, 0, 0, quantity)
    }

    /// A stop order: converts to a market order once triggered.
    pub fn stop(
        id: u64,
        symbol_id: u32,
        side: Side,
        stop_price: u64,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Result<Self, OrderError> {
        Self::new(id, symbol_id, OrderType::Stop, side, time_in_force, 0, stop_price, 0, quantity)
    }

    /// A stop-limit order: converts to a limit order at `price` once triggered.
    pub fn stop_limit(
        id: u64,
        symbol_id: u32,
        side: Side,
        price: u64,
        stop_price: u64,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Result<Self, OrderError> {
        Self::new(
            id,
            symbol_id,
            OrderType::StopLimit,
            side,
            time_in_force,
            price,
            stop_price,
            0,
            quantity,
        )
    }

    /// A trailing-stop order: `stop_price` follows the market by `trail_amount`.
    pub fn trailing_stop(
        id: u64,
        symbol_id: u32,
        side: Side,
        stop_price: u64,
        trail_amount: u64,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Result<Self, OrderError> {
        Self::new(
            id,
            symbol_id,
            OrderType::TrailingStop,
            side,
            time_in_force,
            0,
            stop_price,
            trail_amount,
            quantity,
        )
    }

    /// A trailing-stop-limit order: `stop_price` follows the market; once
    /// triggered it rests as a limit order at `price`.
    #[allow(clippy::too_many_arguments)]
    pub fn trailing_stop_limit(
        id: u64,
        symbol_id: u32,
        side: Side,
        price: u64,
        stop_price: u64,
        trail_amount: u64,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Result<Self, OrderError> {
        Self::new(
            id,
            symbol_id,
            OrderType::TrailingStopLimit,
            side,
            time_in_force,
            price,
            stop_price,
            trail_amount,
            quantity,
        )
    }

    /// Unique id of this order within its book.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The symbol this order belongs to.
    pub fn symbol_id(&self) -> u32 {
        self.symbol_id
    }

    /// Current order type (may change as stop orders activate).
    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Side of the book this order trades on.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Time-in-force of this order.
    pub fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    /// Limit price (0 for a market order).
    pub fn price(&self) -> u64 {
        self.price
    }

    /// Trigger price for stop variants (0 otherwise).
    pub fn stop_price(&self) -> u64 {
        self.stop_price
    }

    /// Trail amount for trailing-stop variants (0 otherwise).
    pub fn trail_amount(&self) -> u64 {
        self.trail_amount
    }

    /// Current total size of the order.
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Total quantity executed so far.
    pub fn executed_quantity(&self) -> u64 {
        self.executed_quantity
    }

    /// Quantity still eligible to trade: `quantity - executed_quantity`.
    pub fn open_quantity(&self) -> u64 {
        self.open_quantity
    }

    /// Price of the most recent execution against this order (0 if none yet).
    pub fn last_executed_price(&self) -> u64 {
        self.last_executed_price
    }

    /// Quantity of the most recent execution against this order (0 if none yet).
    pub fn last_executed_quantity(&self) -> u64 {
        self.last_executed_quantity
    }

    pub(crate) fn is_ask(&self) -> bool {
        matches!(self.side, Side::Ask)
    }

    /// True once `open_quantity` reaches zero.
    pub fn is_filled(&self) -> bool {
        self.open_quantity == 0
    }

    pub(crate) fn is_market(&self) -> bool {
        matches!(self.order_type, OrderType::Market)
    }

    pub(crate) fn is_stop_kind(&self) -> bool {
        self.order_type.is_stop_variant()
    }

    pub(crate) fn is_trailing(&self) -> bool {
        self.order_type.is_trailing()
    }

    pub(crate) fn is_fok(&self) -> bool {
        matches!(self.time_in_force, TimeInForce::Fok)
    }

    pub(crate) fn is_ioc(&self) -> bool {
        matches!(self.time_in_force, TimeInForce::Ioc)
    }

    /// Price a resting limit level should key this order under. For market
    /// orders this is the crossing sentinel, not the nominal `price` field.
    pub(crate) fn effective_price(&self) -> u64 {
        if self.is_market() {
            match self.side {
                Side::Ask => 0,
                Side::Bid => u64::MAX,
            }
        } else {
            self.price
        }
    }

    pub(crate) fn execute(&mut self, price: u64, quantity: u64) {
        debug_assert!(quantity <= self.open_quantity);
        self.open_quantity -= quantity;
        self.executed_quantity += quantity;
        self.last_executed_price = price;
        self.last_executed_quantity = quantity;
    }

    /// Reduce the order's total size by `delta`, clamped so it never drops
    /// below the quantity already executed. Returns the new open quantity.
    pub(crate) fn reduce_quantity(&mut self, delta: u64) -> u64 {
        let delta = delta.min(self.open_quantity);
        self.quantity -= delta;
        self.open_quantity -= delta;
        self.open_quantity
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    pub(crate) fn set_price(&mut self, price: u64) {
        self.price = price;
    }

    /// Converts an activated stop order into its post-trigger form: `Stop`
    /// and `TrailingStop` become `Market`; `StopLimit` and
    /// `TrailingStopLimit` become `Limit`. Clears the stop bookkeeping.
    pub(crate) fn activate(&mut self) {
        debug_assert!(self.is_stop_kind());
        self.order_type = match self.order_type {
            OrderType::Stop | OrderType::TrailingStop => OrderType::Market,
            OrderType::StopLimit | OrderType::TrailingStopLimit => OrderType::Limit,
            other => other,
        };
        self.stop_price = 0;
        self.trail_amount = 0;
    }

    pub(crate) fn set_stop_price(&mut self, stop_price: u64) {
        self.stop_price = stop_price;
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order#{} {} {} {} px={} stop={} qty={} open={}",
            self.id, self.order_type, self.side, self.time_in_force, self.price, self.stop_price, self.quantity, self.open_quantity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_order_open_quantity_starts_full() {
        let o = Order::limit(1, 1, Side::Ask, 100, 50, TimeInForce::Gtc).unwrap();
        assert_eq!(o.open_quantity(), 50);
        assert_eq!(o.quantity(), 50);
        assert!(!o.is_filled());
    }

    #[test]
    fn market_order_rejects_gtc() {
        let err = Order::market(1, 1, Side::Ask, 10, TimeInForce::Gtc).unwrap_err();
        assert!(matches!(err, OrderError::GtcNotAllowed { .. }));
    }

    #[test]
    fn limit_order_requires_positive_price() {
        let err = Order::limit(1, 1, Side::Ask, 0, 10, TimeInForce::Gtc).unwrap_err();
        assert!(matches!(err, OrderError::NonPositivePrice { .. }));
    }

    #[test]
    fn stop_order_requires_positive_stop_price() {
        let err = Order::stop(1, 1, Side::Ask, 0, 10, TimeInForce::Ioc).unwrap_err();
        assert!(matches!(err, OrderError::NonPositiveStopPrice { .. }));
    }

    #[test]
    fn trailing_stop_requires_positive_trail_amount() {
        let err = Order::trailing_stop(1, 1, Side::Bid, 100, 0, 10, TimeInForce::Ioc).unwrap_err();
        assert!(matches!(err, OrderError::NonPositiveTrailAmount { .. }));
    }

    #[test]
    fn execute_reduces_open_and_tracks_last_fill() {
        let mut o = Order::limit(1, 1, Side::Ask, 100, 50, TimeInForce::Gtc).unwrap();
        o.execute(100, 20);
        assert_eq!(o.open_quantity(), 30);
        assert_eq!(o.executed_quantity(), 20);
        assert_eq!(o.last_executed_price(), 100);
        assert_eq!(o.last_executed_quantity(), 20);
        assert!(!o.is_filled());
        o.execute(100, 30);
        assert!(o.is_filled());
    }

    #[test]
    fn reduce_quantity_clamps_to_open() {
        let mut o = Order::limit(1, 1, Side::Ask, 100, 50, TimeInForce::Gtc).unwrap();
        o.execute(100, 20);
        let open = o.reduce_quantity(1_000);
        assert_eq!(open, 0);
        assert_eq!(o.quantity(), 20);
        assert!(o.is_filled());
    }

    #[test]
    fn activate_stop_becomes_market_and_clears_stop_state() {
        let mut o = Order::stop(1, 1, Side::Bid, 500, 10, TimeInForce::Ioc).unwrap();
        o.activate();
        assert!(o.is_market());
        assert_eq!(o.stop_price(), 0);
    }

    #[test]
    fn activate_stop_limit_becomes_limit() {
        let mut o = Order::stop_limit(1, 1, Side::Bid, 400, 500, 10, TimeInForce::Gtc).unwrap();
        o.activate();
        assert_eq!(o.order_type(), OrderType::Limit);
        assert_eq!(o.price(), 400);
    }

    #[test]
    fn market_order_effective_price_is_crossing_sentinel() {
        let ask = Order::market(1, 1, Side::Ask, 10, TimeInForce::Ioc).unwrap();
        assert_eq!(ask.effective_price(), 0);
        let bid = Order::market(2, 1, Side::Bid, 10, TimeInForce::Ioc).unwrap();
        assert_eq!(bid.effective_price(), u64::MAX);
    }
}
