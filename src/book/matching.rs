//! Price-time priority matching: the FOK precheck and the per-level walk
//! that executes an incoming order against the resting book.

use tracing::debug;

use crate::book::book::{Book, LevelKind};
use crate::book::events::{Event, EventSink};
use crate::book::order::{Order, Side};

impl Book {
    /// Attempts to match `order` against the opposing side of the book.
    /// Mutates `order` in place (its `open_quantity` shrinks as it trades)
    /// and emits `OrderExecuted` for every resting order and for `order`
    /// itself, maker first, per trade. Leaves `order` for the caller to
    /// decide whether to rest, delete, or already-filled.
    pub(crate) fn match_order(&mut self, order: &mut Order, sink: &mut dyn EventSink) {
        if order.is_fok() && !self.can_fill_in_full(order) {
            return;
        }
        let opposing_side = order.side().opposite();
        loop {
            if order.is_filled() {
                break;
            }
            let best_price = match opposing_side {
                Side::Ask => self.ask_limits.keys().next().copied(),
                Side::Bid => self.bid_limits.keys().next_back().copied(),
            };
            let Some(resting_price) = best_price else { break };
            if !crosses(order.side(), order.price(), resting_price) {
                break;
            }
            self.execute_against_level(order, opposing_side, resting_price, sink);
        }
    }

    /// Executes `order` against the front of the resting level at
    /// `resting_price`, repeatedly, until the level runs dry or `order`
    /// fills. Deletes resting orders as they fill and the level if it
    /// empties.
    fn execute_against_level(&mut self, order: &mut Order, resting_side: Side, resting_price: u64, sink: &mut dyn EventSink) {
        loop {
            if order.is_filled() {
                return;
            }
            let map = self.level_map_mut(LevelKind::Limit, resting_side);
            let Some(level) = map.get_mut(&resting_price) else { return };
            let Some(handle) = level.front_handle() else { return };
            let resting_id = level.get(handle).unwrap().id();
            let matched = level.execute_order(handle, resting_price, order.open_quantity());
            if matched == 0 {
                return;
            }
            order.execute(resting_price, matched);
            debug!(symbol_id = self.symbol_id, resting_id, taker_id = order.id(), price = resting_price, matched, "trade");
            self.update_reference_prices(resting_side, resting_price);
            self.last_traded_price = resting_price;
            let resting_snapshot = self
                .level_map(LevelKind::Limit, resting_side)
                .get(&resting_price)
                .and_then(|level| level.get(handle))
                .cloned();
            let mut resting_filled = false;
            if let Some(resting_snapshot) = resting_snapshot {
                resting_filled = resting_snapshot.is_filled();
                sink.on_event(&Event::OrderExecuted { order: resting_snapshot });
            }
            sink.on_event(&Event::OrderExecuted { order: order.clone() });
            if resting_filled {
                self.remove_resting(resting_side, resting_price, resting_id, sink);
            }
        }
    }

    fn remove_resting(&mut self, _side: Side, _price: u64, order_id: u64, sink: &mut dyn EventSink) {
        if let Some(order) = self.remove_from_level(order_id) {
            sink.on_event(&Event::OrderDeleted { order });
        }
    }

    /// FOK precheck: sums opposing volume at prices that cross, returns
    /// whether it is enough to fill `order` in one pass.
    fn can_fill_in_full(&self, order: &Order) -> bool {
        let opposing_side = order.side().opposite();
        let map = self.level_map(LevelKind::Limit, opposing_side);
        let available: u64 = match order.side() {
            Side::Bid => map.iter().filter(|(&p, _)| p <= order.price()).map(|(_, l)| l.volume()).sum(),
            Side::Ask => map.iter().filter(|(&p, _)| p >= order.price()).map(|(_, l)| l.volume()).sum(),
        };
        available >= order.open_quantity()
    }
}

fn crosses(taker_side: Side, taker_price: u64, resting_price: u64) -> bool {
    match taker_side {
        Side::Bid => taker_price >= resting_price,
        Side::Ask => taker_price <= resting_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::book::Book;
    use crate::book::events::CollectingSink;
    use crate::book::order::{Order, TimeInForce};

    #[test]
    fn taker_receives_maker_price_improvement() {
        let mut sink = CollectingSink::default();
        let mut book = Book::new(1);
        book.add(Order::limit(1, 1, Side::Bid, 350, 200, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        book.add(Order::limit(2, 1, Side::Ask, 200, 500, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        assert!(!book.contains(1));
        let resting = book.get(2).unwrap();
        assert_eq!(resting.open_quantity(), 300);
        assert_eq!(resting.last_executed_price(), 350);
    }

    #[test]
    fn ioc_walks_multiple_levels_then_drops_remainder() {
        let mut sink = CollectingSink::default();
        let mut book = Book::new(1);
        book.add(Order::limit(1, 1, Side::Ask, 350, 200, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        book.add(Order::limit(2, 1, Side::Ask, 400, 100, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        book.add(Order::limit(3, 1, Side::Bid, 450, 300, TimeInForce::Ioc).unwrap(), &mut sink)
            .unwrap();
        assert!(!book.contains(1));
        assert!(!book.contains(2));
        assert!(!book.contains(3));
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn fok_rejected_when_insufficient_liquidity() {
        let mut sink = CollectingSink::default();
        let mut book = Book::new(1);
        book.add(Order::limit(1, 1, Side::Bid, 350, 200, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        book.add(Order::limit(2, 1, Side::Bid, 400, 100, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        sink.events.clear();
        book.add(Order::limit(3, 1, Side::Ask, 450, 1000, TimeInForce::Fok).unwrap(), &mut sink)
            .unwrap();
        assert!(sink.events.iter().all(|e| !matches!(e, Event::OrderExecuted { .. })));
        assert!(book.contains(1));
        assert!(book.contains(2));
        assert!(!book.contains(3));
    }

    #[test]
    fn market_order_never_rests() {
        let mut sink = CollectingSink::default();
        let mut book = Book::new(1);
        book.add(Order::limit(1, 1, Side::Ask, 350, 200, TimeInForce::Gtc).unwrap(), &mut sink)
            .unwrap();
        book.add(Order::market(2, 1, Side::Bid, 50, TimeInForce::Ioc).unwrap(), &mut sink)
            .unwrap();
        assert!(!book.contains(2));
        assert_eq!(book.get(1).unwrap().open_quantity(), 150);
    }
}
