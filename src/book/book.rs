//! The per-symbol order book: six price-indexed level maps, an id index for
//! O(1) lookup, and the public operations that mutate them.

use std::collections::{BTreeMap, HashMap};

use tracing::{trace, warn};

use crate::book::error::BookError;
use crate::book::events::{Event, EventSink};
use crate::book::level::{Level, LevelHandle};
use crate::book::order::{Order, Side};

/// Which family of level map an order currently rests in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelKind {
    Limit,
    Stop,
    TrailingStop,
}

/// Where an order currently lives: which map, which price key, which slot.
#[derive(Clone, Copy)]
pub(crate) struct OrderLocation {
    pub(crate) kind: LevelKind,
    pub(crate) side: Side,
    pub(crate) price: u64,
    pub(crate) handle: LevelHandle,
}

/// One symbol's order book.
///
/// A `Book` has no internal locking: the concurrency model places exactly
/// one owning worker thread per book (see [`crate::dispatcher`]), so every
/// method here takes `&mut self`.
pub struct Book {
    pub(crate) symbol_id: u32,
    pub(crate) ask_limits: BTreeMap<u64, Level>,
    pub(crate) bid_limits: BTreeMap<u64, Level>,
    pub(crate) ask_stops: BTreeMap<u64, Level>,
    pub(crate) bid_stops: BTreeMap<u64, Level>,
    pub(crate) ask_trailing_stops: BTreeMap<u64, Level>,
    pub(crate) bid_trailing_stops: BTreeMap<u64, Level>,
    pub(crate) orders: HashMap<u64, OrderLocation>,
    pub(crate) last_traded_price: u64,
    /// Reference price used to evaluate bid-side stops: the most recent ask
    /// traded price, symmetrized per SPEC_FULL.md §4.3.
    pub(crate) last_ask_ref: u64,
    /// Reference price used to evaluate ask-side stops: the most recent bid
    /// traded price, symmetrized per SPEC_FULL.md §4.3.
    pub(crate) last_bid_ref: u64,
    /// Ask-reference value already reflected in bid-side trailing-stop
    /// prices; guards `update_bid_trailing_stops` against redundant rebuilds.
    pub(crate) trailing_ask_price: u64,
    /// Bid-reference value already reflected in ask-side trailing-stop
    /// prices; guards `update_ask_trailing_stops` against redundant rebuilds.
    pub(crate) trailing_bid_price: u64,
}

impl Book {
    /// A fresh, empty book for `symbol_id`.
    pub fn new(symbol_id: u32) -> Self {
        Book {
            symbol_id,
            ask_limits: BTreeMap::new(),
            bid_limits: BTreeMap::new(),
            ask_stops: BTreeMap::new(),
            bid_stops: BTreeMap::new(),
            ask_trailing_stops: BTreeMap::new(),
            bid_trailing_stops: BTreeMap::new(),
            orders: HashMap::new(),
            last_traded_price: 0,
            last_ask_ref: 0,
            last_bid_ref: u64::MAX,
            trailing_ask_price: u64::MAX,
            trailing_bid_price: 0,
        }
    }

    /// This book's symbol id.
    pub fn symbol_id(&self) -> u32 {
        self.symbol_id
    }

    /// Lowest resting ask price, if any.
    pub fn best_ask(&self) -> Option<u64> {
        self.ask_limits.keys().next().copied()
    }

    /// Highest resting bid price, if any.
    pub fn best_bid(&self) -> Option<u64> {
        self.bid_limits.keys().next_back().copied()
    }

    /// Most recent trade price (0 if no trade has occurred yet).
    pub fn last_traded_price(&self) -> u64 {
        self.last_traded_price
    }

    /// The ask-side reference consumed when repricing bid-side trailing
    /// stops: the most recent ask-resting trade price, or `u64::MAX` (a
    /// no-op against the `min` clamp in `next_trailing_stop_price`) if no
    /// such trade has happened yet. `last_ask_ref`'s own `0` seed must never
    /// be read as a legitimate reference here — that is what caused a
    /// fresh bid trailing stop to relax to `0` before any trade occurred.
    pub(crate) fn ask_trade_reference(&self) -> u64 {
        if self.last_ask_ref == 0 {
            u64::MAX
        } else {
            self.last_ask_ref
        }
    }

    /// Symmetric to [`Self::ask_trade_reference`], for ask-side trailing
    /// stops repriced off the most recent bid-resting trade.
    pub(crate) fn bid_trade_reference(&self) -> u64 {
        if self.last_bid_ref == u64::MAX {
            0
        } else {
            self.last_bid_ref
        }
    }

    /// Number of resting orders across every level map.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// True if the order id is currently resting in this book.
    pub fn contains(&self, order_id: u64) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Snapshot of a resting order, if present.
    pub fn get(&self, order_id: u64) -> Option<&Order> {
        let loc = self.orders.get(&order_id)?;
        self.level_map(loc.kind, loc.side).get(&loc.price)?.get(loc.handle)
    }

    pub(crate) fn level_map(&self, kind: LevelKind, side: Side) -> &BTreeMap<u64, Level> {
        match (kind, side) {
            (LevelKind::Limit, Side::Ask) => &self.ask_limits,
            (LevelKind::Limit, Side::Bid) => &self.bid_limits,
            (LevelKind::Stop, Side::Ask) => &self.ask_stops,
            (LevelKind::Stop, Side::Bid) => &self.bid_stops,
            (LevelKind::TrailingStop, Side::Ask) => &self.ask_trailing_stops,
            (LevelKind::TrailingStop, Side::Bid) => &self.bid_trailing_stops,
        }
    }

    pub(crate) fn level_map_mut(&mut self, kind: LevelKind, side: Side) -> &mut BTreeMap<u64, Level> {
        match (kind, side) {
            (LevelKind::Limit, Side::Ask) => &mut self.ask_limits,
            (LevelKind::Limit, Side::Bid) => &mut self.bid_limits,
            (LevelKind::Stop, Side::Ask) => &mut self.ask_stops,
            (LevelKind::Stop, Side::Bid) => &mut self.bid_stops,
            (LevelKind::TrailingStop, Side::Ask) => &mut self.ask_trailing_stops,
            (LevelKind::TrailingStop, Side::Bid) => &mut self.bid_trailing_stops,
        }
    }

    /// Inserts `order` as a new resting order in the named map, recording
    /// its location in the id index. The order must not already be indexed.
    pub(crate) fn insert_into_level(&mut self, kind: LevelKind, side: Side, price: u64, order: Order) {
        let id = order.id();
        let map = self.level_map_mut(kind, side);
        let level = map.entry(price).or_default();
        let handle = level.push_back(order);
        self.orders.insert(id, OrderLocation { kind, side, price, handle });
    }

    /// Removes an order from whichever level map holds it, deleting the
    /// level too if it becomes empty. Does not emit an event.
    pub(crate) fn remove_from_level(&mut self, order_id: u64) -> Option<Order> {
        let loc = self.orders.remove(&order_id)?;
        let map = self.level_map_mut(loc.kind, loc.side);
        let level = map.get_mut(&loc.price).expect("level referenced by index must exist");
        let order = level.remove(loc.handle);
        if level.is_empty() {
            map.remove(&loc.price);
        }
        Some(order)
    }

    /// Public: add a new order. Emits `OrderAdded` up front, then whatever
    /// the matching/insertion/activation cascade produces.
    pub fn add(&mut self, order: Order, sink: &mut dyn EventSink) -> Result<(), BookError> {
        let id = order.id();
        trace!(symbol_id = self.symbol_id, order_id = id, "add_order");
        if self.orders.contains_key(&id) {
            warn!(symbol_id = self.symbol_id, order_id = id, "add_order rejected: duplicate id");
            return Err(BookError::DuplicateOrderId { order_id: id });
        }
        sink.on_event(&Event::OrderAdded { order: order.clone() });
        self.dispatch_add(order, sink);
        self.activate_stop_orders(sink);
        self.debug_validate();
        Ok(())
    }

    fn dispatch_add(&mut self, order: Order, sink: &mut dyn EventSink) {
        if order.is_stop_kind() {
            self.add_stop_order(order, sink);
        } else if order.is_market() {
            self.add_market_order(order, sink);
        } else {
            self.add_limit_order(order, sink);
        }
    }

    pub(crate) fn add_limit_order(&mut self, mut order: Order, sink: &mut dyn EventSink) {
        self.match_order(&mut order, sink);
        if order.is_filled() {
            sink.on_event(&Event::OrderDeleted { order });
        } else if order.is_ioc() || order.is_fok() {
            sink.on_event(&Event::OrderDeleted { order });
        } else {
            let price = order.price();
            let side = order.side();
            self.insert_into_level(LevelKind::Limit, side, price, order);
        }
    }

    pub(crate) fn add_market_order(&mut self, mut order: Order, sink: &mut dyn EventSink) {
        order.set_price(order.effective_price());
        self.match_order(&mut order, sink);
        sink.on_event(&Event::OrderDeleted { order });
    }

    /// Public: cancel `quantity` off an order's size. Deletes the order
    /// entirely if that empties it.
    pub fn cancel(&mut self, order_id: u64, quantity: u64, sink: &mut dyn EventSink) -> Result<(), BookError> {
        trace!(symbol_id = self.symbol_id, order_id, quantity, "cancel_order");
        if quantity == 0 {
            warn!(symbol_id = self.symbol_id, order_id, "cancel_order rejected: zero quantity");
            return Err(BookError::ZeroQuantity);
        }
        let loc = *self.orders.get(&order_id).ok_or_else(|| {
            warn!(symbol_id = self.symbol_id, order_id, "cancel_order rejected: unknown order");
            BookError::UnknownOrder { order_id }
        })?;
        let open_before = self
            .level_map(loc.kind, loc.side)
            .get(&loc.price)
            .and_then(|level| level.get(loc.handle))
            .map(|order| order.open_quantity())
            .unwrap_or(0);
        if quantity > open_before {
            warn!(symbol_id = self.symbol_id, order_id, quantity, open_before, "cancel_order rejected: exceeds open quantity");
            return Err(BookError::QuantityExceedsOpen {
                requested: quantity,
                available: open_before,
            });
        }
        let new_open = {
            let map = self.level_map_mut(loc.kind, loc.side);
            let level = map.get_mut(&loc.price).expect("level referenced by index must exist");
            level.reduce_order(loc.handle, quantity)
        };
        let snapshot = self.get(order_id).cloned();
        if let Some(snapshot) = snapshot {
            sink.on_event(&Event::OrderUpdated { order: snapshot });
        }
        if new_open == 0 {
            self.delete_internal(order_id, true, sink);
        } else {
            self.drop_level_if_empty(loc.kind, loc.side, loc.price);
        }
        self.activate_stop_orders(sink);
        self.debug_validate();
        Ok(())
    }

    pub(crate) fn drop_level_if_empty(&mut self, kind: LevelKind, side: Side, price: u64) {
        let map = self.level_map_mut(kind, side);
        if map.get(&price).is_some_and(Level::is_empty) {
            map.remove(&price);
        }
    }

    /// Public: execute `quantity` of an order. `price` overrides the
    /// executing price; `None` executes at the order's own resting price.
    pub fn execute(&mut self, order_id: u64, quantity: u64, price: Option<u64>, sink: &mut dyn EventSink) -> Result<(), BookError> {
        trace!(symbol_id = self.symbol_id, order_id, quantity, "execute_order");
        if quantity == 0 {
            warn!(symbol_id = self.symbol_id, order_id, "execute_order rejected: zero quantity");
            return Err(BookError::ZeroQuantity);
        }
        let loc = *self.orders.get(&order_id).ok_or_else(|| {
            warn!(symbol_id = self.symbol_id, order_id, "execute_order rejected: unknown order");
            BookError::UnknownOrder { order_id }
        })?;
        let price = match price {
            Some(price) => price,
            None => self
                .level_map(loc.kind, loc.side)
                .get(&loc.price)
                .and_then(|level| level.get(loc.handle))
                .map(Order::price)
                .unwrap_or(0),
        };
        if price == 0 {
            warn!(symbol_id = self.symbol_id, order_id, "execute_order rejected: non-positive price");
            return Err(BookError::NonPositivePrice);
        }
        {
            let map = self.level_map_mut(loc.kind, loc.side);
            let level = map.get_mut(&loc.price).expect("level referenced by index must exist");
            level.execute_order(loc.handle, price, quantity);
        }
        self.last_traded_price = price;
        self.update_reference_prices(loc.side, price);
        let filled = self.get(order_id).map(Order::is_filled).unwrap_or(false);
        let snapshot = self.get(order_id).cloned();
        if let Some(snapshot) = snapshot {
            sink.on_event(&Event::OrderExecuted { order: snapshot });
        }
        if filled {
            self.delete_internal(order_id, true, sink);
        } else {
            self.drop_level_if_empty(loc.kind, loc.side, loc.price);
        }
        self.activate_stop_orders(sink);
        self.debug_validate();
        Ok(())
    }

    /// Updates the symmetrized stop-activation reference prices after a
    /// trade involving a resting order on `resting_side` at `price`.
    pub(crate) fn update_reference_prices(&mut self, resting_side: Side, price: u64) {
        match resting_side {
            Side::Ask => self.last_ask_ref = price,
            Side::Bid => self.last_bid_ref = price,
        }
    }

    /// Public: unconditionally remove an order from the book.
    pub fn delete(&mut self, order_id: u64, sink: &mut dyn EventSink) -> Result<(), BookError> {
        trace!(symbol_id = self.symbol_id, order_id, "delete_order");
        if !self.orders.contains_key(&order_id) {
            warn!(symbol_id = self.symbol_id, order_id, "delete_order rejected: unknown order");
            return Err(BookError::UnknownOrder { order_id });
        }
        self.delete_internal(order_id, true, sink);
        self.activate_stop_orders(sink);
        self.debug_validate();
        Ok(())
    }

    pub(crate) fn delete_internal(&mut self, order_id: u64, notify: bool, sink: &mut dyn EventSink) {
        let order = match self.remove_from_level(order_id) {
            Some(order) => order,
            None => return,
        };
        if notify {
            sink.on_event(&Event::OrderDeleted { order });
        }
    }

    /// Public: replace an order with a new id/price. Equivalent to a full
    /// delete (with notification) followed by an add of the replacement.
    pub fn replace(&mut self, order_id: u64, new_order_id: u64, new_price: u64, sink: &mut dyn EventSink) -> Result<(), BookError> {
        trace!(symbol_id = self.symbol_id, order_id, new_order_id, new_price, "replace_order");
        if self.orders.contains_key(&new_order_id) {
            warn!(symbol_id = self.symbol_id, new_order_id, "replace_order rejected: duplicate new id");
            return Err(BookError::DuplicateOrderId { order_id: new_order_id });
        }
        let mut replacement = self.get(order_id).cloned().ok_or_else(|| {
            warn!(symbol_id = self.symbol_id, order_id, "replace_order rejected: unknown order");
            BookError::UnknownOrder { order_id }
        })?;
        self.delete_internal(order_id, true, sink);
        replacement.set_id(new_order_id);
        replacement.set_price(new_price);
        self.add(replacement, sink)?;
        Ok(())
    }

    /// Debug-only consistency checks corresponding to SPEC_FULL.md §8's
    /// book invariants. Compiled out of release builds.
    #[cfg(debug_assertions)]
    pub(crate) fn debug_validate(&self) {
        if let (Some(ask), Some(bid)) = (self.best_ask(), self.best_bid()) {
            debug_assert!(ask > bid, "crossed book: best ask {ask} <= best bid {bid}");
        }
        for (kind, side, map) in [
            (LevelKind::Limit, Side::Ask, &self.ask_limits),
            (LevelKind::Limit, Side::Bid, &self.bid_limits),
            (LevelKind::Stop, Side::Ask, &self.ask_stops),
            (LevelKind::Stop, Side::Bid, &self.bid_stops),
            (LevelKind::TrailingStop, Side::Ask, &self.ask_trailing_stops),
            (LevelKind::TrailingStop, Side::Bid, &self.bid_trailing_stops),
        ] {
            for (price, level) in map {
                debug_assert!(!level.is_empty(), "{kind:?}/{side:?} level at {price} is empty but present");
                let mut volume = 0u64;
                for order in level.iter() {
                    debug_assert!(!order.is_filled(), "filled order {} left resting", order.id());
                    debug_assert_eq!(order.side(), side);
                    volume += order.open_quantity();
                }
                debug_assert_eq!(volume, level.volume(), "level volume out of sync at {price}");
            }
        }
    }

    #[cfg(not(debug_assertions))]
    pub(crate) fn debug_validate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::order::{Order, Side, TimeInForce};

    #[test]
    fn add_limit_order_rests_when_book_empty() {
        let mut sink = crate::book::events::CollectingSink::default();
        let mut book = Book::new(1);
        let order = Order::limit(1, 1, Side::Ask, 100, 10, TimeInForce::Gtc).unwrap();
        book.add(order, &mut sink).unwrap();
        assert_eq!(book.best_ask(), Some(100));
        assert!(book.contains(1));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut sink = crate::book::events::CollectingSink::default();
        let mut book = Book::new(1);
        book.add(Order::limit(1, 1, Side::Ask, 100, 10, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        let err = book
            .add(Order::limit(1, 1, Side::Ask, 100, 10, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap_err();
        assert!(matches!(err, BookError::DuplicateOrderId { order_id: 1 }));
    }

    #[test]
    fn cancel_reduces_quantity_and_keeps_order_resting() {
        let mut sink = crate::book::events::CollectingSink::default();
        let mut book = Book::new(1);
        book.add(Order::limit(1, 1, Side::Ask, 350, 200, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        book.cancel(1, 100, &mut sink).unwrap();
        let order = book.get(1).unwrap();
        assert_eq!(order.open_quantity(), 100);
        assert_eq!(order.quantity(), 100);
        assert_eq!(book.ask_limits.get(&350).unwrap().volume(), 100);
    }

    #[test]
    fn cancel_full_quantity_deletes_order() {
        let mut sink = crate::book::events::CollectingSink::default();
        let mut book = Book::new(1);
        book.add(Order::limit(1, 1, Side::Ask, 350, 200, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        book.cancel(1, 200, &mut sink).unwrap();
        assert!(!book.contains(1));
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn cancel_rejects_unknown_order() {
        let mut sink = crate::book::events::CollectingSink::default();
        let mut book = Book::new(1);
        let err = book.cancel(42, 1, &mut sink).unwrap_err();
        assert!(matches!(err, BookError::UnknownOrder { order_id: 42 }));
    }

    #[test]
    fn cancel_rejects_quantity_exceeding_open() {
        let mut sink = crate::book::events::CollectingSink::default();
        let mut book = Book::new(1);
        book.add(Order::limit(1, 1, Side::Ask, 350, 200, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        let err = book.cancel(1, 500, &mut sink).unwrap_err();
        assert!(matches!(err, BookError::QuantityExceedsOpen { .. }));
    }

    #[test]
    fn replace_is_delete_then_add_with_new_id_and_price() {
        let mut sink = crate::book::events::CollectingSink::default();
        let mut book = Book::new(1);
        book.add(Order::limit(1, 1, Side::Bid, 1500, 1000, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        book.replace(1, 2, 1200, &mut sink).unwrap();
        assert!(!book.contains(1));
        assert!(book.contains(2));
        let order = book.get(2).unwrap();
        assert_eq!(order.price(), 1200);
        assert_eq!(order.quantity(), 1000);
        assert_eq!(
            sink.events,
            vec![
                Event::OrderAdded {
                    order: Order::limit(1, 1, Side::Bid, 1500, 1000, TimeInForce::Gtc).unwrap()
                },
                Event::OrderDeleted {
                    order: Order::limit(1, 1, Side::Bid, 1500, 1000, TimeInForce::Gtc).unwrap()
                },
                Event::OrderAdded { order: order.clone() },
            ]
        );
    }

    #[test]
    fn delete_rejects_unknown_order() {
        let mut sink = crate::book::events::CollectingSink::default();
        let mut book = Book::new(1);
        let err = book.delete(99, &mut sink).unwrap_err();
        assert!(matches!(err, BookError::UnknownOrder { order_id: 99 }));
    }
}
