//! Application Layer - Drivers around the order book
//!
//! The domain layer has no notion of time or threads. This layer supplies
//! them: who submits, how often the matcher sweeps, and how a run stops.

pub mod services;

// Re-export key services
pub use services::{Simulation, SimulationConfig, SimulationSummary};
