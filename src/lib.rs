// 全局内存分配器：使用 jemalloc
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

pub mod application;
pub mod domain;
pub mod interfaces;
pub mod shared;

pub use domain::{BookConfig, BookEvents, MatchReport, MatchingEngine, OrderBook};
pub use shared::{BookError, Fill, Order, Side};
