//! Lock-free collections for the order book
//!
//! - ReservationQueue: bounded MPSC ring buffer with reserve/commit publication

pub mod reservation_queue;

pub use reservation_queue::{Consumer, ReservationQueue};
