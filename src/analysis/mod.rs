//! Analysis modules.
//!
//! Per-region latency statistics computed over the telemetry store.

pub mod aggregator;

pub use aggregator::*;
