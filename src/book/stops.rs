//! Stop and trailing-stop orders: insertion into the stop-price-keyed
//! maps, the activation cascade, and trailing-stop repricing.
//!
//! Adapted from an intrusive best-price-lookup design to this book's
//! symmetrized `last_ask_ref` / `last_bid_ref` scalars, so triggering a
//! stop is a scalar compare rather than a best-price recomputation.
//! Triggering reads those scalars raw (untraded means "never triggers",
//! which `0`/`u64::MAX` already encode correctly). Repricing a trailing
//! stop instead goes through [`Book::ask_trade_reference`] /
//! [`Book::bid_trade_reference`], which substitute the clamp's own
//! neutral element for an untraded scalar so a trailing stop added
//! before any trade is never relaxed toward `0`.

use crate::book::book::{Book, LevelKind};
use crate::book::events::{Event, EventSink};
use crate::book::order::{Order, Side};

impl Book {
    /// Inserts a stop or trailing-stop order into the level keyed by its
    /// current `stop_price`.
    pub(crate) fn add_stop_order(&mut self, order: Order, _sink: &mut dyn EventSink) {
        let kind = if order.is_trailing() { LevelKind::TrailingStop } else { LevelKind::Stop };
        let side = order.side();
        let price = order.stop_price();
        self.insert_into_level(kind, side, price, order);
    }

    /// The activation cascade run after every public operation: alternately
    /// activates triggered bid-side and ask-side stops, repricing trailing
    /// stops on the opposite side between each, until a full pass triggers
    /// nothing.
    ///
    /// A trailing stop repriced into triggerable territory by this pass is
    /// picked up on the *next* call to this cascade (the next public
    /// operation, or the next outer loop iteration if something else in
    /// this pass also activated) rather than inline — this matches
    /// SPEC_FULL.md §4.3's activation-loop pseudocode literally, where only
    /// `activate_bid_stops`/`activate_ask_stops` feed `activated`.
    pub(crate) fn activate_stop_orders(&mut self, sink: &mut dyn EventSink) {
        loop {
            let mut activated = false;
            activated |= self.activate_bid_stops(sink);
            self.update_ask_trailing_stops(sink);
            activated |= self.activate_ask_stops(sink);
            self.update_bid_trailing_stops(sink);
            if !activated {
                break;
            }
        }
    }

    /// Activates bid-side stops/trailing-stops whose `stop_price` has been
    /// reached by the ask reference (`stop_price <= last_ask_ref`), lowest
    /// triggered price first.
    fn activate_bid_stops(&mut self, sink: &mut dyn EventSink) -> bool {
        let mut activated = false;
        for kind in [LevelKind::Stop, LevelKind::TrailingStop] {
            loop {
                let ref_price = self.last_ask_ref;
                let Some(price) = self.lowest_triggered(kind, Side::Bid, |stop_price| stop_price <= ref_price) else {
                    break;
                };
                self.activate_front(kind, Side::Bid, price, sink);
                activated = true;
            }
        }
        activated
    }

    /// Activates ask-side stops/trailing-stops whose `stop_price` has been
    /// reached by the bid reference (`stop_price >= last_bid_ref`), lowest
    /// triggered price first.
    fn activate_ask_stops(&mut self, sink: &mut dyn EventSink) -> bool {
        let mut activated = false;
        for kind in [LevelKind::Stop, LevelKind::TrailingStop] {
            loop {
                let ref_price = self.last_bid_ref;
                let Some(price) = self.lowest_triggered(kind, Side::Ask, |stop_price| stop_price >= ref_price) else {
                    break;
                };
                self.activate_front(kind, Side::Ask, price, sink);
                activated = true;
            }
        }
        activated
    }

    /// The lowest `kind`/`side` stop price that satisfies `triggers`. Plain
    /// stops and trailing stops are drained as separate passes by the
    /// callers above (all of one kind before any of the other), matching
    /// `map_orderbook.cpp`'s `activateBidStopOrders`/`activateAskStopOrders`
    /// rather than interleaving the two families by price.
    fn lowest_triggered(&self, kind: LevelKind, side: Side, triggers: impl Fn(u64) -> bool) -> Option<u64> {
        let price = self.level_map(kind, side).keys().next().copied()?;
        triggers(price).then_some(price)
    }

    /// Activates the front (earliest-added) order at `kind`/`side`/`price`:
    /// removes it from its stop level with no event, converts it to its
    /// post-trigger type, emits `OrderUpdated`, then re-enters it through
    /// the ordinary limit/market add path (which may itself trade and move
    /// the reference prices further).
    fn activate_front(&mut self, kind: LevelKind, side: Side, price: u64, sink: &mut dyn EventSink) {
        let order_id = {
            let level = self
                .level_map(kind, side)
                .get(&price)
                .expect("lowest_triggered only returns prices present in the map");
            level.front().expect("non-empty level").id()
        };
        let mut order = self.remove_from_level(order_id).expect("just located by id");
        order.activate();
        sink.on_event(&Event::OrderUpdated { order: order.clone() });
        if order.is_market() {
            self.add_market_order(order, sink);
        } else {
            self.add_limit_order(order, sink);
        }
    }

    /// Reprices ask-side trailing stops against the bid reference, unless
    /// the reference hasn't moved since the last reprice. Returns whether
    /// any order's `stop_price` actually changed, so the activation loop
    /// can re-check triggers against the new prices.
    fn update_ask_trailing_stops(&mut self, sink: &mut dyn EventSink) -> bool {
        let ref_price = self.last_bid_ref;
        if ref_price == self.trailing_bid_price {
            return false;
        }
        self.trailing_bid_price = ref_price;
        self.reprice_trailing_stops(Side::Ask, sink)
    }

    /// Reprices bid-side trailing stops against the ask reference, unless
    /// the reference hasn't moved since the last reprice. Returns whether
    /// any order's `stop_price` actually changed.
    fn update_bid_trailing_stops(&mut self, sink: &mut dyn EventSink) -> bool {
        let ref_price = self.last_ask_ref;
        if ref_price == self.trailing_ask_price {
            return false;
        }
        self.trailing_ask_price = ref_price;
        self.reprice_trailing_stops(Side::Bid, sink)
    }

    /// Rebuilds `side`'s trailing-stop map with each order's `stop_price`
    /// moved toward (never away from) the current reference, preserving
    /// intra-price FIFO order. Returns whether any `stop_price` changed.
    fn reprice_trailing_stops(&mut self, side: Side, sink: &mut dyn EventSink) -> bool {
        let ids: Vec<u64> = self
            .level_map(LevelKind::TrailingStop, side)
            .values()
            .flat_map(|level| level.iter().map(Order::id))
            .collect();
        let mut changed = false;
        for id in ids {
            let Some(mut order) = self.remove_from_level(id) else { continue };
            let new_stop = self.next_trailing_stop_price(side, &order);
            if new_stop != order.stop_price() {
                order.set_stop_price(new_stop);
                sink.on_event(&Event::OrderUpdated { order: order.clone() });
                changed = true;
            }
            self.insert_into_level(LevelKind::TrailingStop, side, new_stop, order);
        }
        changed
    }

    /// The clamped, monotonic next `stop_price` for a trailing-stop order on
    /// `side`: bid-side trails down toward `ask_ref - trail` (floor 0),
    /// ask-side trails up toward `bid_ref + trail` (ceiling `u64::MAX`);
    /// neither ever moves the other way.
    fn next_trailing_stop_price(&self, side: Side, order: &Order) -> u64 {
        let trail = order.trail_amount();
        match side {
            Side::Bid => self.ask_trade_reference().saturating_sub(trail).min(order.stop_price()),
            Side::Ask => self.bid_trade_reference().saturating_add(trail).max(order.stop_price()),
        }
    }
}
