//! Core types and engines for trafficwatch
//!
//! This crate provides:
//! - The sliding-window statistics repository (`StatsRepository`)
//! - Frequency counting with deterministic top-K (`FrequencyCounter`)
//! - The traffic alert state machine (`TrafficAlert`)
//! - Periodic report generation (`StatsReporter`)
//! - CLF access-log parsing (`parse_line`)
//! - Configuration and error types

#![forbid(unsafe_code)]

pub mod alert;
pub mod config;
pub mod counter;
pub mod error;
pub mod metrics;
pub mod parse;
pub mod record;
pub mod reporter;
pub mod repository;
pub mod stats;
pub mod worker;

// Re-export key types for convenience
pub use alert::{TrafficAlert, TrafficTotals};
pub use config::Config;
pub use counter::FrequencyCounter;
pub use error::{Error, Result};
pub use metrics::{GlobalMetrics, GlobalMetricsSnapshot, global_metrics};
pub use parse::parse_line;
pub use record::LogRecord;
pub use reporter::StatsReporter;
pub use repository::StatsRepository;
pub use stats::{AggregatedStats, SecondStats};
pub use worker::PeriodicWorker;
