//! Domain Layer - Matching
//!
//! Periodic batch matching over a drained ticker: bucket sort by price,
//! then two-pointer pairing.

pub mod engine;
pub mod price_buckets;

pub use engine::{MatchReport, MatchingEngine};
pub use price_buckets::{PriceBuckets, PriceOrder};
