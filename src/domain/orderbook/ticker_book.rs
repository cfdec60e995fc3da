//! One ticker's pair of order queues

use crate::shared::collections::ReservationQueue;
use crate::shared::protocol::{Order, Side};

/// Buy and sell queues for a single ticker id
///
/// Any number of threads may publish; matching claims the consumer role of
/// both queues for the duration of a pass.
pub struct TickerBook {
    ticker: u32,
    buys: ReservationQueue<Order>,
    sells: ReservationQueue<Order>,
}

impl TickerBook {
    pub fn new(ticker: u32, queue_capacity: usize) -> Self {
        Self {
            ticker,
            buys: ReservationQueue::with_capacity(queue_capacity),
            sells: ReservationQueue::with_capacity(queue_capacity),
        }
    }

    #[inline]
    pub fn ticker(&self) -> u32 {
        self.ticker
    }

    /// Queue holding orders of the given side
    #[inline]
    pub fn queue(&self, side: Side) -> &ReservationQueue<Order> {
        match side {
            Side::Buy => &self.buys,
            Side::Sell => &self.sells,
        }
    }

    /// Publishes onto the order's own side; hands the order back when full.
    #[inline]
    pub fn publish(&self, order: Order) -> Result<(), Order> {
        self.queue(order.side).try_publish(order)
    }

    /// Approximate `(buy, sell)` queue depths
    pub fn depth(&self) -> (usize, usize) {
        (self.buys.len(), self.sells.len())
    }

    pub fn queue_capacity(&self) -> usize {
        self.buys.capacity()
    }
}
