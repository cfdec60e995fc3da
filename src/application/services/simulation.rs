//! Simulation Service - random producers + periodic matcher
//!
//! Drives an `OrderBook` the way a trading floor would:
//!
//! - **Producers**: N named threads, each submitting a random order then
//!   sleeping `submit_interval`
//! - **Matcher**: one named thread sweeping every ticker with `match_all`
//!   then sleeping `match_interval`; it is the only consumer of every queue
//! - **Shutdown**: a shared stop flag; producers are joined first, then the
//!   matcher
//!
//! ## Usage
//! ```rust,ignore
//! use lockfree_book::application::services::{Simulation, SimulationConfig};
//!
//! let summary = Simulation::new(SimulationConfig::default()).run()?;
//! println!("{} fills", summary.fills);
//! ```

use crate::domain::orderbook::{BookConfig, BookEvents, OrderBook, TracingEvents};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{Side, MAX_PRICE, MIN_PRICE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest single sleep, so loops notice the stop flag promptly
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Configuration for a simulation run
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// How long producers keep submitting
    pub duration: Duration,

    /// Number of producer threads
    pub producers: usize,

    /// Pause between two submissions of one producer
    pub submit_interval: Duration,

    /// Pause between two matcher sweeps
    pub match_interval: Duration,

    /// Random quantities are drawn from `1..=max_quantity`
    pub max_quantity: u32,

    /// Seed for reproducible order streams (producer i uses `seed + i`)
    pub seed: Option<u64>,

    /// Pin the matcher thread to the last core (needs `cpu-affinity`)
    pub pin_matcher: bool,

    /// Book dimensions
    pub book: BookConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(2),
            producers: 3,
            submit_interval: Duration::from_millis(50),
            match_interval: Duration::from_millis(500),
            max_quantity: 500,
            seed: None,
            pin_matcher: false,
            book: BookConfig::default(),
        }
    }
}

/// Simulation errors
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Thread {0} panicked")]
    ThreadPanicked(String),
}

/// Final counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationSummary {
    pub producers: usize,
    pub submitted: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub sweeps: u64,
    pub fills: u64,
    pub filled_quantity: u64,
    pub reinjection_drops: u64,
    pub resident_buys: usize,
    pub resident_sells: usize,
}

/// Stops a running simulation from another thread
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct ProducerStats {
    submitted: u64,
    accepted: u64,
    rejected: u64,
}

#[derive(Debug, Default)]
struct MatcherStats {
    sweeps: u64,
    fills: u64,
    filled_quantity: u64,
    dropped: u64,
}

/// One simulation run over its own order book
pub struct Simulation<E: BookEvents + 'static = TracingEvents> {
    config: SimulationConfig,
    book: Arc<OrderBook<E>>,
    running: Arc<AtomicBool>,
}

impl Simulation<TracingEvents> {
    /// Simulation that logs through `tracing`
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_events(config, TracingEvents)
    }
}

impl<E: BookEvents + 'static> Simulation<E> {
    pub fn with_events(config: SimulationConfig, events: E) -> Self {
        let book = Arc::new(OrderBook::with_config(config.book.clone(), events));
        Self {
            config,
            book,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn book(&self) -> &Arc<OrderBook<E>> {
        &self.book
    }

    /// Runs producers and the matcher for `duration` (or until stopped),
    /// then shuts down and reports.
    pub fn run(self) -> Result<SimulationSummary, SimulationError> {
        tracing::info!(
            producers = self.config.producers,
            duration_ms = self.config.duration.as_millis() as u64,
            "simulation starting"
        );

        let mut producers = Vec::with_capacity(self.config.producers);
        for id in 0..self.config.producers {
            let book = Arc::clone(&self.book);
            let running = Arc::clone(&self.running);
            let config = self.config.clone();
            let spawned = thread::Builder::new()
                .name(format!("producer-{}", id))
                .spawn(move || run_producer(id, &*book, &running, &config));

            match spawned {
                Ok(handle) => producers.push(handle),
                Err(source) => {
                    self.abort(producers);
                    return Err(SimulationError::Spawn {
                        name: format!("producer-{}", id),
                        source,
                    });
                }
            }
        }

        let matcher = {
            let book = Arc::clone(&self.book);
            let running = Arc::clone(&self.running);
            let config = self.config.clone();
            thread::Builder::new()
                .name("matcher".to_string())
                .spawn(move || run_matcher(&*book, &running, &config))
        };
        let matcher = match matcher {
            Ok(handle) => handle,
            Err(source) => {
                self.abort(producers);
                return Err(SimulationError::Spawn {
                    name: "matcher".to_string(),
                    source,
                });
            }
        };

        sleep_while_running(&self.running, self.config.duration);
        self.running.store(false, Ordering::Release);

        let mut summary = SimulationSummary {
            producers: self.config.producers,
            ..Default::default()
        };

        let mut panicked = None;
        for (id, handle) in producers.into_iter().enumerate() {
            match handle.join() {
                Ok(stats) => {
                    summary.submitted += stats.submitted;
                    summary.accepted += stats.accepted;
                    summary.rejected += stats.rejected;
                }
                Err(_) => panicked = Some(format!("producer-{}", id)),
            }
        }

        match matcher.join() {
            Ok(stats) => {
                summary.sweeps = stats.sweeps;
                summary.fills = stats.fills;
                summary.filled_quantity = stats.filled_quantity;
                summary.reinjection_drops = stats.dropped;
            }
            Err(_) => panicked = Some("matcher".to_string()),
        }

        if let Some(name) = panicked {
            return Err(SimulationError::ThreadPanicked(name));
        }

        let (buys, sells) = self.book.resident_orders();
        summary.resident_buys = buys;
        summary.resident_sells = sells;

        tracing::info!(
            submitted = summary.submitted,
            rejected = summary.rejected,
            fills = summary.fills,
            sweeps = summary.sweeps,
            "simulation complete"
        );
        Ok(summary)
    }

    /// Stops and joins the producers already started.
    fn abort(&self, producers: Vec<thread::JoinHandle<ProducerStats>>) {
        self.running.store(false, Ordering::Release);
        for handle in producers {
            let _ = handle.join();
        }
    }
}

fn run_producer<E: BookEvents>(
    id: usize,
    book: &OrderBook<E>,
    running: &AtomicBool,
    config: &SimulationConfig,
) -> ProducerStats {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
        None => StdRng::from_entropy(),
    };
    let ticker_count = book.ticker_count() as u32;
    let max_quantity = config.max_quantity.max(1);
    let mut stats = ProducerStats::default();

    while running.load(Ordering::Acquire) {
        let side = if rng.gen::<bool>() { Side::Buy } else { Side::Sell };
        let ticker = rng.gen_range(0..ticker_count);
        let quantity = rng.gen_range(1..=max_quantity);
        let price = rng.gen_range(MIN_PRICE..=MAX_PRICE);

        stats.submitted += 1;
        // 拒单已由 BookEvents 报告，这里只计数
        match book.submit(side, ticker, quantity, price) {
            Ok(_) => stats.accepted += 1,
            Err(_) => stats.rejected += 1,
        }

        pause(running, config.submit_interval);
    }

    tracing::debug!(producer = id, submitted = stats.submitted, "producer exiting");
    stats
}

fn run_matcher<E: BookEvents>(
    book: &OrderBook<E>,
    running: &AtomicBool,
    config: &SimulationConfig,
) -> MatcherStats {
    if config.pin_matcher {
        pin_current_thread();
    }

    let mut engine = book.matching_engine();
    let mut stats = MatcherStats::default();

    while running.load(Ordering::Acquire) {
        let sweep = book.match_all(&mut engine);
        stats.sweeps += 1;
        stats.fills += sweep.fills as u64;
        stats.filled_quantity += sweep.filled_quantity;
        stats.dropped += sweep.dropped as u64;

        let (buys, sells) = book.resident_orders();
        METRICS.resident_orders.with_label_values(&["buy"]).set(buys as f64);
        METRICS.resident_orders.with_label_values(&["sell"]).set(sells as f64);

        pause(running, config.match_interval);
    }

    tracing::debug!(sweeps = stats.sweeps, "matcher exiting");
    stats
}

#[cfg(feature = "cpu-affinity")]
fn pin_current_thread() {
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(core) = core_ids.last() {
            core_affinity::set_for_current(*core);
        }
    }
}

#[cfg(not(feature = "cpu-affinity"))]
fn pin_current_thread() {
    tracing::warn!("pin_matcher set but built without the cpu-affinity feature");
}

/// Sleeps for `interval`, or just yields when it is zero.
fn pause(running: &AtomicBool, interval: Duration) {
    if interval.is_zero() {
        thread::yield_now();
    } else {
        sleep_while_running(running, interval);
    }
}

/// Sleeps up to `total`, waking early once the stop flag is cleared.
fn sleep_while_running(running: &AtomicBool, total: Duration) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}
