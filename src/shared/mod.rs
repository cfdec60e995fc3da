//! Shared utilities and types used across all layers
//!
//! This module contains:
//! - Protocol definitions (side, order, fill) and book-wide constants
//! - Lock-free collections (reservation queue)
//! - Error type
//! - Metrics

pub mod collections;
pub mod error;
pub mod metrics;
pub mod protocol;

// Re-export commonly used types
pub use error::BookError;
pub use protocol::{Fill, Order, Side, MAX_PRICE, MIN_PRICE, PRICE_LEVELS, TICKER_COUNT};
