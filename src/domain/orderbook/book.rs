//! Order book: a fixed table of per-ticker queue pairs
//!
//! Built once, fully populated, never resized. `submit` may be called from
//! any number of threads at once; match passes go through a
//! `MatchingEngine` owned by the (single) matching thread.
//!
//! ```rust,ignore
//! let book = OrderBook::new(TracingEvents);
//! book.submit(Side::Buy, 7, 100, 50)?;
//! book.submit(Side::Sell, 7, 100, 50)?;
//!
//! let mut engine = book.matching_engine();
//! let report = book.match_ticker(7, &mut engine)?;
//! assert_eq!(report.fills.len(), 1);
//! ```

use crate::domain::matching::engine::{MatchReport, MatchingEngine};
use crate::domain::orderbook::ticker_book::TickerBook;
use crate::domain::orderbook::traits::{BookEvents, NoopEvents};
use crate::domain::validation::{OrderValidator, ValidationConfig};
use crate::shared::error::BookError;
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{Order, Side, DEFAULT_QUEUE_CAPACITY, TICKER_COUNT};
use serde::Serialize;
use std::time::Instant;

/// Book dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookConfig {
    /// Number of tickers; ids are `0..ticker_count`
    pub ticker_count: usize,

    /// Capacity of every buy and sell queue (power of two)
    pub queue_capacity: usize,

    /// Largest quantity a single submission may carry
    pub max_quantity: u32,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            ticker_count: TICKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_quantity: u32::MAX,
        }
    }
}

/// Totals over one `match_all` sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Tickers that had at least one order on either side
    pub active_tickers: usize,
    pub fills: usize,
    pub filled_quantity: u64,
    pub reinjected: usize,
    pub dropped: usize,
    /// Tickers skipped because another pass held them
    pub busy_tickers: usize,
}

/// Per-ticker order book table
pub struct OrderBook<E: BookEvents = NoopEvents> {
    tickers: Box<[TickerBook]>,
    validator: OrderValidator,
    events: E,
    queue_capacity: usize,
}

impl OrderBook<NoopEvents> {
    /// Default-sized book that reports nothing
    pub fn silent() -> Self {
        Self::new(NoopEvents)
    }
}

impl<E: BookEvents> OrderBook<E> {
    /// 1024 tickers, 128-slot queues
    pub fn new(events: E) -> Self {
        Self::with_config(BookConfig::default(), events)
    }

    /// # Panics
    /// If `ticker_count` is zero or exceeds `u32::MAX`, or `queue_capacity`
    /// is not a power of two.
    pub fn with_config(config: BookConfig, events: E) -> Self {
        assert!(config.ticker_count > 0, "Ticker count must be greater than 0");
        assert!(
            u32::try_from(config.ticker_count).is_ok(),
            "Ticker count must fit in u32"
        );

        let tickers = (0..config.ticker_count as u32)
            .map(|ticker| TickerBook::new(ticker, config.queue_capacity))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let validator = OrderValidator::with_config(ValidationConfig {
            ticker_count: config.ticker_count,
            max_quantity: config.max_quantity,
            ..Default::default()
        });

        Self {
            tickers,
            validator,
            events,
            queue_capacity: config.queue_capacity,
        }
    }

    /// Validates and queues an order.
    ///
    /// # Returns
    /// * `Ok(order)` echoing the queued order
    /// * `Err(BookError::QueueFull)` if that side of the ticker is at
    ///   capacity; nothing was queued and nothing will be retried
    /// * `Err(BookError::Invalid*)` if the submission is malformed
    ///
    /// Either way the outcome is also reported to the book's events.
    pub fn submit(
        &self,
        side: Side,
        ticker: u32,
        quantity: u32,
        price: u32,
    ) -> Result<Order, BookError> {
        if let Err(err) = self.validator.validate(ticker, quantity, price) {
            self.events.order_rejected(ticker, side, &err);
            return Err(err);
        }

        let order = Order::new(side, ticker, quantity, price);
        match self.tickers[ticker as usize].publish(order) {
            Ok(()) => {
                self.events.order_accepted(&order);
                Ok(order)
            }
            Err(_) => {
                let err = BookError::QueueFull { ticker, side };
                self.events.order_rejected(ticker, side, &err);
                Err(err)
            }
        }
    }

    /// Runs one match pass for `ticker`.
    pub fn match_ticker(
        &self,
        ticker: u32,
        engine: &mut MatchingEngine,
    ) -> Result<MatchReport, BookError> {
        let book = self.ticker_book(ticker)?;
        self.timed_pass(book, engine)
    }

    /// Runs one match pass for every ticker in id order.
    ///
    /// Tickers whose consumer role is held elsewhere are skipped and counted.
    pub fn match_all(&self, engine: &mut MatchingEngine) -> SweepSummary {
        let mut summary = SweepSummary::default();

        for book in self.tickers.iter() {
            if book.depth() == (0, 0) {
                continue;
            }
            summary.active_tickers += 1;

            match self.timed_pass(book, engine) {
                Ok(report) => {
                    summary.fills += report.fills.len();
                    summary.filled_quantity += report.filled_quantity();
                    summary.reinjected += report.reinjected;
                    summary.dropped += report.dropped;
                }
                Err(err) => {
                    tracing::debug!(ticker = book.ticker(), "skipping ticker: {}", err);
                    summary.busy_tickers += 1;
                }
            }
        }

        summary
    }

    /// 执行一次撮合并记录耗时 (微秒)
    fn timed_pass(
        &self,
        book: &TickerBook,
        engine: &mut MatchingEngine,
    ) -> Result<MatchReport, BookError> {
        let start = Instant::now();
        let report = engine.run_pass(book, &self.events)?;
        METRICS
            .match_pass_duration
            .observe(start.elapsed().as_secs_f64() * 1_000_000.0);
        Ok(report)
    }

    /// Engine sized for this book's queues
    pub fn matching_engine(&self) -> MatchingEngine {
        MatchingEngine::new(self.queue_capacity)
    }

    /// Approximate `(buy, sell)` depths for one ticker
    pub fn depth(&self, ticker: u32) -> Result<(usize, usize), BookError> {
        Ok(self.ticker_book(ticker)?.depth())
    }

    /// Approximate `(buy, sell)` totals across every ticker
    pub fn resident_orders(&self) -> (usize, usize) {
        self.tickers.iter().fold((0, 0), |(buys, sells), book| {
            let (b, s) = book.depth();
            (buys + b, sells + s)
        })
    }

    /// Direct access to one ticker's queues
    pub fn ticker_book(&self, ticker: u32) -> Result<&TickerBook, BookError> {
        self.validator.validate_ticker(ticker)?;
        Ok(&self.tickers[ticker as usize])
    }

    pub fn ticker_count(&self) -> usize {
        self.tickers.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn events(&self) -> &E {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orderbook::traits::{BookEvent, RecordingEvents};

    fn small_book() -> OrderBook<RecordingEvents> {
        OrderBook::with_config(
            BookConfig {
                ticker_count: 8,
                queue_capacity: 4,
                ..Default::default()
            },
            RecordingEvents::new(),
        )
    }

    #[test]
    fn test_default_dimensions() {
        let book = OrderBook::silent();
        assert_eq!(book.ticker_count(), TICKER_COUNT);
        assert_eq!(book.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
        assert!(book.depth(1023).is_ok());
    }

    #[test]
    fn test_submit_echoes_order() {
        let book = small_book();
        let order = book.submit(Side::Sell, 3, 40, 55).unwrap();
        assert_eq!(order, Order::new(Side::Sell, 3, 40, 55));
        assert_eq!(book.events().events(), vec![BookEvent::Accepted(order)]);
        assert_eq!(book.depth(3).unwrap(), (0, 1));
    }

    #[test]
    fn test_invalid_ticker_rejected_before_queue() {
        let book = small_book();
        let err = book.submit(Side::Buy, 8, 1, 50).unwrap_err();
        assert_eq!(err, BookError::InvalidTicker { ticker: 8, max: 8 });
        assert_eq!(book.resident_orders(), (0, 0));
        assert!(matches!(
            book.events().events()[0],
            BookEvent::Rejected { ticker: 8, side: Side::Buy, .. }
        ));

        let mut engine = book.matching_engine();
        assert!(book.match_ticker(8, &mut engine).is_err());
        assert!(book.depth(8).is_err());
    }

    #[test]
    fn test_full_queue_rejects_exactly_one() {
        let book = small_book();
        let results: Vec<_> = (0..5).map(|_| book.submit(Side::Buy, 1, 1, 20)).collect();

        let rejected = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(rejected, 1);
        assert_eq!(
            results[4],
            Err(BookError::QueueFull { ticker: 1, side: Side::Buy })
        );
        // 另一侧和其他ticker不受影响
        assert!(book.submit(Side::Sell, 1, 1, 20).is_ok());
        assert!(book.submit(Side::Buy, 2, 1, 20).is_ok());
    }

    #[test]
    fn test_match_all_skips_empty_and_aggregates() {
        let book = small_book();
        book.submit(Side::Buy, 0, 10, 50).unwrap();
        book.submit(Side::Sell, 0, 4, 45).unwrap();
        book.submit(Side::Buy, 5, 7, 30).unwrap();
        book.submit(Side::Sell, 5, 7, 30).unwrap();
        book.submit(Side::Sell, 6, 1, 99).unwrap();

        let mut engine = book.matching_engine();
        let summary = book.match_all(&mut engine);

        assert_eq!(summary.active_tickers, 3);
        assert_eq!(summary.fills, 2);
        assert_eq!(summary.filled_quantity, 11);
        // ticker 0 剩余买单 6@50，ticker 6 的卖单原样放回
        assert_eq!(summary.reinjected, 2);
        assert_eq!(summary.busy_tickers, 0);
        assert_eq!(book.resident_orders(), (1, 1));
    }

    #[test]
    fn test_match_all_counts_busy_tickers() {
        let book = small_book();
        book.submit(Side::Buy, 2, 1, 50).unwrap();
        let held = book.ticker_book(2).unwrap().queue(Side::Buy).consumer();

        let summary = book.match_all(&mut book.matching_engine());
        assert_eq!(summary.busy_tickers, 1);
        drop(held);
    }

    #[test]
    fn test_match_all_records_pass_duration() {
        let book = small_book();
        book.submit(Side::Buy, 3, 10, 50).unwrap();
        book.submit(Side::Sell, 3, 10, 50).unwrap();

        // 全局指标可能被并行测试同时更新，只检查增长
        let before = METRICS.match_pass_duration.get_sample_count();
        let summary = book.match_all(&mut book.matching_engine());
        assert_eq!(summary.fills, 1);
        assert!(METRICS.match_pass_duration.get_sample_count() > before);
    }
}
