//! Domain Layer - OrderBook Module
//!
//! - `TickerBook`: buy and sell reservation queues for one ticker
//! - `OrderBook`: the fixed ticker table with `submit` / `match_ticker`
//! - `BookEvents`: reporting collaborator seam

pub mod book;
pub mod ticker_book;
pub mod traits;

pub use book::{BookConfig, OrderBook, SweepSummary};
pub use ticker_book::TickerBook;
pub use traits::{BookEvent, BookEvents, NoopEvents, RecordingEvents, TracingEvents};
