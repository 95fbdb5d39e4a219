//! cornlet-bench: HTTP load generator for a host's public endpoint.
//!
//! Spawns concurrent clients that issue plain GETs for a fixed duration and
//! reports throughput and latency. It knows nothing about the worker protocol.

pub mod report;
pub mod runner;
pub mod stats;

pub use report::Report;
pub use runner::{BenchConfig, ClientStats, run};
pub use stats::LatencySummary;
