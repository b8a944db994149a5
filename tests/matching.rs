//! End-to-end matching scenarios from SPEC_FULL.md §8: price-time priority,
//! price improvement, IOC multi-level walks, FOK all-or-nothing, cancel and
//! replace semantics.

use exchange_core::prelude::*;

fn limit(id: u64, side: Side, price: u64, qty: u64, tif: TimeInForce) -> Order {
    Order::limit(id, 1, side, price, qty, tif).unwrap()
}

#[test]
fn taker_price_improvement() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    book.add(limit(1, Side::Bid, 350, 200, TimeInForce::Gtc), &mut sink).unwrap();
    book.add(limit(2, Side::Ask, 200, 500, TimeInForce::Gtc), &mut sink).unwrap();

    assert!(!book.contains(1));
    let resting = book.get(2).expect("ask 2 still resting");
    assert_eq!(resting.open_quantity(), 300);
    assert_eq!(resting.last_executed_price(), 350);
    assert_eq!(book.best_ask(), Some(200));
    assert!(book.best_bid().is_none());

    let kinds: Vec<&str> = sink
        .events
        .iter()
        .map(|e| match e {
            Event::OrderAdded { .. } => "added",
            Event::OrderExecuted { .. } => "executed",
            Event::OrderDeleted { .. } => "deleted",
            Event::OrderUpdated { .. } => "updated",
            Event::SymbolAdded { .. } => "symbol_added",
            Event::SymbolDeleted { .. } => "symbol_deleted",
        })
        .collect();
    assert_eq!(kinds, vec!["added", "added", "executed", "executed", "deleted"]);
}

#[test]
fn ioc_walks_multiple_levels_then_fully_fills() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    book.add(limit(1, Side::Ask, 350, 200, TimeInForce::Gtc), &mut sink).unwrap();
    book.add(limit(2, Side::Ask, 400, 100, TimeInForce::Gtc), &mut sink).unwrap();
    book.add(limit(3, Side::Bid, 450, 300, TimeInForce::Ioc), &mut sink).unwrap();

    assert!(!book.contains(1));
    assert!(!book.contains(2));
    assert!(!book.contains(3));
    assert!(book.best_ask().is_none());
    assert!(book.best_bid().is_none());

    let executed_prices: Vec<u64> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            Event::OrderExecuted { order } => Some(order.last_executed_price()),
            _ => None,
        })
        .collect();
    // Two trades, maker then taker snapshot each, at 350 then at 400.
    assert_eq!(executed_prices, vec![350, 350, 400, 400]);
}

#[test]
fn fok_rejected_leaves_resting_book_untouched() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    book.add(limit(1, Side::Bid, 350, 200, TimeInForce::Gtc), &mut sink).unwrap();
    book.add(limit(2, Side::Bid, 400, 100, TimeInForce::Gtc), &mut sink).unwrap();
    sink.events.clear();

    book.add(limit(3, Side::Ask, 450, 1000, TimeInForce::Fok), &mut sink).unwrap();

    assert!(sink.events.iter().all(|e| !matches!(e, Event::OrderExecuted { .. })));
    assert_eq!(sink.events.len(), 2);
    assert!(matches!(sink.events[0], Event::OrderAdded { .. }));
    assert!(matches!(sink.events[1], Event::OrderDeleted { .. }));

    assert!(book.contains(1));
    assert!(book.contains(2));
    assert!(!book.contains(3));
    assert_eq!(book.get(1).unwrap().open_quantity(), 200);
    assert_eq!(book.get(2).unwrap().open_quantity(), 100);
}

#[test]
fn fok_accepted_when_liquidity_is_sufficient() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    book.add(limit(1, Side::Bid, 350, 200, TimeInForce::Gtc), &mut sink).unwrap();
    book.add(limit(2, Side::Bid, 400, 100, TimeInForce::Gtc), &mut sink).unwrap();
    book.add(limit(3, Side::Ask, 300, 300, TimeInForce::Fok), &mut sink).unwrap();

    assert!(!book.contains(3));
    // Crosses 400 first (best bid), then 350.
    assert!(!book.contains(2));
    assert!(!book.contains(1));
}

#[test]
fn cancel_reduces_quantity_but_keeps_order_resting() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    book.add(limit(1, Side::Ask, 350, 200, TimeInForce::Gtc), &mut sink).unwrap();
    book.cancel(1, 100, &mut sink).unwrap();

    let order = book.get(1).expect("order 1 still resting");
    assert_eq!(order.open_quantity(), 100);
    assert_eq!(order.quantity(), 100);

    assert_eq!(
        sink.events,
        vec![
            Event::OrderAdded { order: limit(1, Side::Ask, 350, 200, TimeInForce::Gtc) },
            Event::OrderUpdated { order: order.clone() },
        ]
    );
}

#[test]
fn replace_is_delete_then_add_with_new_identity() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    book.add(limit(1, Side::Bid, 1500, 1000, TimeInForce::Gtc), &mut sink).unwrap();
    book.replace(1, 2, 1200, &mut sink).unwrap();

    assert!(!book.contains(1));
    let replacement = book.get(2).expect("replacement order resting");
    assert_eq!(replacement.price(), 1200);
    assert_eq!(replacement.quantity(), 1000);

    assert_eq!(sink.events.len(), 3);
    assert!(matches!(sink.events[0], Event::OrderAdded { .. }));
    assert!(matches!(sink.events[1], Event::OrderDeleted { .. }));
    assert!(matches!(sink.events[2], Event::OrderAdded { .. }));
}

#[test]
fn add_then_delete_is_an_identity_when_nothing_matches() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    let before_best_ask = book.best_ask();
    let before_best_bid = book.best_bid();

    book.add(limit(1, Side::Ask, 500, 75, TimeInForce::Gtc), &mut sink).unwrap();
    book.delete(1, &mut sink).unwrap();

    assert_eq!(book.best_ask(), before_best_ask);
    assert_eq!(book.best_bid(), before_best_bid);
    assert_eq!(book.order_count(), 0);
    assert_eq!(sink.events.len(), 2);
    assert!(matches!(sink.events[0], Event::OrderAdded { .. }));
    assert!(matches!(sink.events[1], Event::OrderDeleted { .. }));
}

#[test]
fn execution_conservation_across_a_matched_pair() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    book.add(limit(1, Side::Bid, 100, 40, TimeInForce::Gtc), &mut sink).unwrap();
    book.add(limit(2, Side::Ask, 90, 40, TimeInForce::Gtc), &mut sink).unwrap();

    let executed_total: u64 = sink
        .events
        .iter()
        .filter_map(|e| match e {
            Event::OrderExecuted { order } => Some(order.last_executed_quantity()),
            _ => None,
        })
        .sum();
    // Maker (id=1) and taker (id=2) each get one OrderExecuted event for the
    // same 40-unit trade: 2 * m.
    assert_eq!(executed_total, 80);
}

#[test]
fn market_order_crosses_regardless_of_nominal_price_and_never_rests() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    book.add(limit(1, Side::Ask, 350, 200, TimeInForce::Gtc), &mut sink).unwrap();
    book.add(Order::market(2, 1, Side::Bid, 50, TimeInForce::Ioc).unwrap(), &mut sink).unwrap();

    assert!(!book.contains(2));
    assert_eq!(book.get(1).unwrap().open_quantity(), 150);
}

#[test]
fn duplicate_order_id_is_rejected_without_side_effects() {
    let mut book = Book::new(1);
    let mut sink = CollectingSink::default();

    book.add(limit(1, Side::Ask, 350, 200, TimeInForce::Gtc), &mut sink).unwrap();
    let err = book.add(limit(1, Side::Ask, 360, 50, TimeInForce::Gtc), &mut sink).unwrap_err();

    assert!(matches!(err, BookError::DuplicateOrderId { order_id: 1 }));
    assert_eq!(book.get(1).unwrap().price(), 350);
    assert_eq!(book.get(1).unwrap().quantity(), 200);
}
