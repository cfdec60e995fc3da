//! Main entry point for the order book simulation
//!
//! Thin wrapper that delegates to `interfaces::cli`.

use lockfree_book::interfaces::cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
