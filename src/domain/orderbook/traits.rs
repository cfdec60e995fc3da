//! BookEvents Trait - Reporting Collaborator
//!
//! The order book never prints. Every submission outcome and every fill is
//! handed to a `BookEvents` implementation chosen by whoever builds the book.
//!
//! ## Design Principles
//! - **Zero-Cost Abstraction**: `OrderBook<E>` is generic over the sink, so
//!   calls are monomorphized and `NoopEvents` compiles away
//! - **Testability**: `RecordingEvents` captures everything for assertions
//!
//! ## Implementations
//! - `NoopEvents`: discard everything
//! - `TracingEvents`: structured logs + Prometheus counters (used by the CLI)
//! - `RecordingEvents`: in-memory event log for tests
//!
//! Callbacks run on the submitting or matching thread, so they must be cheap
//! and must never call back into the book.

use crate::shared::error::BookError;
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{Fill, Order, Side};
use parking_lot::Mutex;

/// Reporting collaborator
///
/// All methods have empty default implementations; implement only what
/// you need.
pub trait BookEvents: Send + Sync {
    /// A submission was committed to its queue. `order` echoes its fields.
    fn order_accepted(&self, _order: &Order) {}

    /// A submission was rejected before or at the queue.
    fn order_rejected(&self, _ticker: u32, _side: Side, _error: &BookError) {}

    /// A match pass paired a buy and a sell.
    fn fill(&self, _fill: &Fill) {}

    /// A remainder order could not be re-injected after a match pass because
    /// producers refilled its queue during the drain; the order is gone.
    fn order_dropped(&self, _order: &Order) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl BookEvents for NoopEvents {}

/// Logs through `tracing` and updates the global metrics
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl BookEvents for TracingEvents {
    fn order_accepted(&self, order: &Order) {
        METRICS.orders_total.with_label_values(&[order.side.as_str()]).inc();
        tracing::debug!(
            ticker = order.ticker,
            side = %order.side,
            quantity = order.quantity,
            price = order.price,
            "order added"
        );
    }

    fn order_rejected(&self, ticker: u32, side: Side, error: &BookError) {
        METRICS.rejections_total.with_label_values(&[error.reason()]).inc();
        tracing::warn!(ticker, side = %side, "order rejected: {}", error);
    }

    fn fill(&self, fill: &Fill) {
        METRICS.fills_total.inc();
        METRICS.filled_quantity_total.inc_by(u64::from(fill.quantity));
        tracing::info!(
            ticker = fill.ticker,
            quantity = fill.quantity,
            price = fill.price,
            "matched"
        );
    }

    fn order_dropped(&self, order: &Order) {
        METRICS.reinjection_drops_total.inc();
        tracing::warn!(
            ticker = order.ticker,
            side = %order.side,
            quantity = order.quantity,
            price = order.price,
            "queue full on re-injection, order dropped"
        );
    }
}

/// One recorded callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookEvent {
    Accepted(Order),
    Rejected { ticker: u32, side: Side, error: BookError },
    Fill(Fill),
    Dropped(Order),
}

/// Collects every event in arrival order
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<BookEvent>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<BookEvent> {
        self.events.lock().clone()
    }

    /// Recorded fills only
    pub fn fills(&self) -> Vec<Fill> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                BookEvent::Fill(fill) => Some(*fill),
                _ => None,
            })
            .collect()
    }

    /// Removes and returns everything recorded so far
    pub fn take(&self) -> Vec<BookEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl BookEvents for RecordingEvents {
    fn order_accepted(&self, order: &Order) {
        self.events.lock().push(BookEvent::Accepted(*order));
    }

    fn order_rejected(&self, ticker: u32, side: Side, error: &BookError) {
        self.events.lock().push(BookEvent::Rejected {
            ticker,
            side,
            error: error.clone(),
        });
    }

    fn fill(&self, fill: &Fill) {
        self.events.lock().push(BookEvent::Fill(*fill));
    }

    fn order_dropped(&self, order: &Order) {
        self.events.lock().push(BookEvent::Dropped(*order));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_events_order() {
        let events = RecordingEvents::new();
        let order = Order::new(Side::Buy, 1, 10, 50);
        let fill = Fill { fill_id: 1, ticker: 1, quantity: 10, price: 50 };

        events.order_accepted(&order);
        events.fill(&fill);

        assert_eq!(
            events.events(),
            vec![BookEvent::Accepted(order), BookEvent::Fill(fill)]
        );
        assert_eq!(events.fills(), vec![fill]);

        assert_eq!(events.take().len(), 2);
        assert!(events.events().is_empty());
    }

    #[test]
    fn test_noop_events_default_methods() {
        let events = NoopEvents;
        events.order_accepted(&Order::new(Side::Sell, 0, 1, 10));
        events.order_rejected(0, Side::Sell, &BookError::QueueFull { ticker: 0, side: Side::Sell });
    }

    #[test]
    fn test_tracing_events_counts_fills() {
        let before = METRICS.fills_total.get();
        TracingEvents.fill(&Fill { fill_id: 1, ticker: 2, quantity: 5, price: 20 });
        assert!(METRICS.fills_total.get() > before);
    }
}
