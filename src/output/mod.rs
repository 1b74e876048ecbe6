//! Output module for frontier reports
//!
//! This module handles:
//! - Capturing statistics snapshots from the frontier's counters
//! - Printing them for the command-line tool

pub mod stats;

pub use stats::{print_statistics, FrontierCounters, FrontierStatistics};
