//! The symbol-sharded concurrent dispatcher: [`ConcurrentMarket`] routes
//! every operation for a symbol to the one worker thread that owns it, for
//! that symbol's entire lifetime (SPEC_FULL.md §4.5, §5).

mod market;
mod worker;

pub use market::ConcurrentMarket;
