//! Domain Layer - Core Business Logic
//!
//! Pure order book logic: no threads, no timers, no I/O. Producers and the
//! matcher cadence live in the application layer.
//!
//! ## Modules
//! - `orderbook`: ticker table, per-ticker queue pairs, reporting seam
//! - `matching`: the drain/sort/pair/re-inject pass
//! - `validation`: submission boundary checks

pub mod matching;
pub mod orderbook;
pub mod validation;

// Re-export key types
pub use matching::{MatchReport, MatchingEngine};
pub use orderbook::{BookConfig, BookEvents, OrderBook, SweepSummary, TickerBook};
pub use validation::{OrderValidator, ValidationConfig};
