//! Log tailing and the monitoring facade.
//!
//! Wires the core engines together: a polling file tailer feeds parsed
//! records into the statistics repository, which drives both the alert
//! state machine and the periodic reporter.

#![forbid(unsafe_code)]

pub mod monitor;
pub mod tail;

pub use monitor::TrafficMonitor;
pub use tail::LogTailer;
