//! Application Services
//!
//! - `simulation`: producer threads + periodic matcher over one order book

pub mod simulation;

pub use simulation::{
    ShutdownHandle, Simulation, SimulationConfig, SimulationError, SimulationSummary,
};
