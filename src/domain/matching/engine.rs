//! Matching Engine - one drain/sort/pair/re-inject pass per ticker
//!
//! A pass over a `TickerBook`:
//! 1. claim the consumer role of both queues and drain them (at most one
//!    queue capacity per side)
//! 2. drop (and report) any order priced outside `[MIN_PRICE, MAX_PRICE]`;
//!    if a side came back empty, re-publish everything and stop
//! 3. bucket-sort sells ascending and buys descending by price
//! 4. walk both sequences with two pointers, filling at the sell price while
//!    the best buy still reaches the best sell
//! 5. re-publish every order with quantity left; filled orders are gone
//!
//! Work is O(n + PRICE_LEVELS) for n drained orders. All buffers are owned
//! by the engine and reused across passes, so a pass does not allocate once
//! the engine has seen the book's queue capacity.
//!
//! Re-published orders go behind anything producers committed while the
//! pass was running, so time priority across passes is approximate.

use crate::domain::matching::price_buckets::{PriceBuckets, PriceOrder};
use crate::domain::orderbook::ticker_book::TickerBook;
use crate::domain::orderbook::traits::BookEvents;
use crate::shared::error::BookError;
use crate::shared::protocol::{Fill, Order, Side, MAX_PRICE, MIN_PRICE};
use smallvec::SmallVec;

/// Outcome of one pass over one ticker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    pub ticker: u32,
    /// Orders taken off the buy queue
    pub buys_drained: usize,
    /// Orders taken off the sell queue
    pub sells_drained: usize,
    /// Fills in execution order
    pub fills: SmallVec<[Fill; 8]>,
    /// Orders published back with quantity left
    pub reinjected: usize,
    /// Orders lost because their queue was full at re-injection, or because
    /// their price was outside the bucket range
    pub dropped: usize,
    /// Elementary steps (dequeues, bucket work, pair checks, re-publishes)
    pub steps: usize,
}

impl MatchReport {
    /// Sum of all fill quantities
    pub fn filled_quantity(&self) -> u64 {
        self.fills.iter().map(|f| u64::from(f.quantity)).sum()
    }
}

/// Single-consumer matcher with reusable scratch space
pub struct MatchingEngine {
    drained_buys: Vec<Order>,
    drained_sells: Vec<Order>,
    sorted_buys: Vec<Order>,
    sorted_sells: Vec<Order>,
    buckets: PriceBuckets,
    next_fill_id: u64,
}

impl MatchingEngine {
    /// Creates an engine whose buffers fit queues of `queue_capacity`
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            drained_buys: Vec::with_capacity(queue_capacity),
            drained_sells: Vec::with_capacity(queue_capacity),
            sorted_buys: Vec::with_capacity(queue_capacity),
            sorted_sells: Vec::with_capacity(queue_capacity),
            buckets: PriceBuckets::new(),
            next_fill_id: 1,
        }
    }

    /// Runs one pass over `book`, reporting fills and drops to `events`.
    ///
    /// Fails with `MatchInProgress` without touching either queue if another
    /// pass holds the consumer role of either side.
    pub fn run_pass<E: BookEvents + ?Sized>(
        &mut self,
        book: &TickerBook,
        events: &E,
    ) -> Result<MatchReport, BookError> {
        let ticker = book.ticker();
        let busy = BookError::MatchInProgress { ticker };
        let mut buy_consumer = book.queue(Side::Buy).consumer().ok_or_else(|| busy.clone())?;
        let mut sell_consumer = book.queue(Side::Sell).consumer().ok_or(busy)?;

        let limit = book.queue_capacity();
        self.drained_buys.clear();
        self.drained_buys.extend(buy_consumer.drain(limit));
        self.drained_sells.clear();
        self.drained_sells.extend(sell_consumer.drain(limit));

        let mut report = MatchReport {
            ticker,
            buys_drained: self.drained_buys.len(),
            sells_drained: self.drained_sells.len(),
            ..Default::default()
        };
        report.steps = report.buys_drained + report.sells_drained;

        // 绕过校验直接 publish 的订单可能价格越界，桶排序放不下
        discard_unpriceable(&mut self.drained_buys, events, &mut report);
        discard_unpriceable(&mut self.drained_sells, events, &mut report);

        if self.drained_buys.is_empty() || self.drained_sells.is_empty() {
            reinject(book, &self.drained_buys, events, &mut report);
            reinject(book, &self.drained_sells, events, &mut report);
            return Ok(report);
        }

        report.steps += self.buckets.sort_into(
            &self.drained_sells,
            &mut self.sorted_sells,
            PriceOrder::best_first(Side::Sell),
        );
        report.steps += self.buckets.sort_into(
            &self.drained_buys,
            &mut self.sorted_buys,
            PriceOrder::best_first(Side::Buy),
        );

        let buys = &mut self.sorted_buys;
        let sells = &mut self.sorted_sells;
        let (mut i, mut j) = (0, 0);
        while i < buys.len() && j < sells.len() {
            report.steps += 1;
            let buy = &mut buys[i];
            let sell = &mut sells[j];

            // 买价降序、卖价升序：当前最高买价够不到最低卖价，后面也不会成交
            if buy.price < sell.price {
                break;
            }

            let quantity = buy.quantity.min(sell.quantity);
            buy.quantity -= quantity;
            sell.quantity -= quantity;

            let fill = Fill {
                fill_id: self.next_fill_id,
                ticker,
                quantity,
                price: sell.price,
            };
            self.next_fill_id += 1;
            events.fill(&fill);
            report.fills.push(fill);

            if buy.quantity == 0 {
                i += 1;
            }
            if sell.quantity == 0 {
                j += 1;
            }
        }

        reinject(book, &self.sorted_buys, events, &mut report);
        reinject(book, &self.sorted_sells, events, &mut report);

        Ok(report)
    }
}

/// Removes orders the bucket sort cannot place and reports them as dropped.
fn discard_unpriceable<E: BookEvents + ?Sized>(
    orders: &mut Vec<Order>,
    events: &E,
    report: &mut MatchReport,
) {
    orders.retain(|o| {
        let priced = (MIN_PRICE..=MAX_PRICE).contains(&o.price);
        if !priced && !o.is_filled() {
            report.dropped += 1;
            events.order_dropped(o);
        }
        priced
    });
}

/// Publishes every order that still has quantity back onto its own side.
fn reinject<E: BookEvents + ?Sized>(
    book: &TickerBook,
    orders: &[Order],
    events: &E,
    report: &mut MatchReport,
) {
    for order in orders.iter().filter(|o| !o.is_filled()) {
        report.steps += 1;
        match book.publish(*order) {
            Ok(()) => report.reinjected += 1,
            Err(lost) => {
                report.dropped += 1;
                events.order_dropped(&lost);
            }
        }
    }
}
