//! Order Validator - Submission Boundary Checks
//!
//! Rejects malformed submissions before any queue is touched.
//!
//! ## Validation Rules
//! - Ticker must be below the configured ticker count
//! - Price must lie within the bucketed price range `[MIN_PRICE, MAX_PRICE]`
//! - Quantity must be positive and within the configured maximum
//!
//! Out-of-range prices are rejected rather than clamped: the matching pass
//! buckets by integer price and an order outside the range would have no
//! bucket to land in.

use crate::shared::error::BookError;
use crate::shared::protocol::{MAX_PRICE, MIN_PRICE, TICKER_COUNT};

/// Order validation configuration
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Number of supported tickers (valid ids are `0..ticker_count`)
    pub ticker_count: usize,

    /// Minimum price (inclusive)
    pub min_price: u32,

    /// Maximum price (inclusive)
    pub max_price: u32,

    /// Minimum quantity (inclusive)
    pub min_quantity: u32,

    /// Maximum quantity (inclusive)
    pub max_quantity: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ticker_count: TICKER_COUNT,
            min_price: MIN_PRICE,
            max_price: MAX_PRICE,
            min_quantity: 1,
            max_quantity: u32::MAX,
        }
    }
}

/// Order validator
pub struct OrderValidator {
    config: ValidationConfig,
}

impl OrderValidator {
    /// Creates a new validator with default configuration
    pub fn new() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    /// Creates a new validator with custom configuration
    ///
    /// The price band is always narrowed to `[MIN_PRICE, MAX_PRICE]`, since
    /// the matching pass cannot bucket anything outside it.
    pub fn with_config(mut config: ValidationConfig) -> Self {
        config.min_price = config.min_price.max(MIN_PRICE);
        config.max_price = config.max_price.min(MAX_PRICE);
        config.min_quantity = config.min_quantity.max(1);
        Self { config }
    }

    /// Validates a submission
    ///
    /// # Returns
    /// * `Ok(())` if the order may be queued
    /// * `Err(BookError)` naming the first rule that failed
    pub fn validate(&self, ticker: u32, quantity: u32, price: u32) -> Result<(), BookError> {
        self.validate_ticker(ticker)?;
        self.validate_price(price)?;
        self.validate_quantity(quantity)?;
        Ok(())
    }

    /// Validates the ticker id alone
    pub fn validate_ticker(&self, ticker: u32) -> Result<(), BookError> {
        if ticker as usize >= self.config.ticker_count {
            return Err(BookError::InvalidTicker {
                ticker,
                max: self.config.ticker_count,
            });
        }
        Ok(())
    }

    fn validate_price(&self, price: u32) -> Result<(), BookError> {
        if price < self.config.min_price || price > self.config.max_price {
            return Err(BookError::InvalidPrice {
                price,
                min: self.config.min_price,
                max: self.config.max_price,
            });
        }
        Ok(())
    }

    fn validate_quantity(&self, quantity: u32) -> Result<(), BookError> {
        if quantity < self.config.min_quantity || quantity > self.config.max_quantity {
            return Err(BookError::InvalidQuantity {
                quantity,
                min: self.config.min_quantity,
                max: self.config.max_quantity,
            });
        }
        Ok(())
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }
}

impl Default for OrderValidator {
    fn default() -> Self {
        Self::new()
    }
}
