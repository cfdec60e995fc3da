//! Order book error type

use crate::shared::protocol::Side;

/// Errors surfaced by submission and matching
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    #[error("Queue full: ticker {ticker} {side} side, order dropped")]
    QueueFull { ticker: u32, side: Side },

    #[error("Invalid ticker {ticker}: must be below {max}")]
    InvalidTicker { ticker: u32, max: usize },

    #[error("Invalid price {price}: must be within [{min}, {max}]")]
    InvalidPrice { price: u32, min: u32, max: u32 },

    #[error("Invalid quantity {quantity}: must be within [{min}, {max}]")]
    InvalidQuantity { quantity: u32, min: u32, max: u32 },

    #[error("Ticker {ticker} already has an active match pass")]
    MatchInProgress { ticker: u32 },
}

impl BookError {
    /// Whether the same submission may succeed if tried again later.
    ///
    /// Nothing in the book retries on its own; this is the backpressure
    /// signal handed to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookError::QueueFull { .. } | BookError::MatchInProgress { .. }
        )
    }

    /// Metric label
    pub fn reason(&self) -> &'static str {
        match self {
            BookError::QueueFull { .. } => "queue_full",
            BookError::InvalidTicker { .. } => "invalid_ticker",
            BookError::InvalidPrice { .. } => "invalid_price",
            BookError::InvalidQuantity { .. } => "invalid_quantity",
            BookError::MatchInProgress { .. } => "match_in_progress",
        }
    }
}
