//! Error types for trafficwatch

use thiserror::Error;

/// Result type alias for trafficwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for trafficwatch
#[derive(Debug, Error)]
pub enum Error {
    /// The sliding window must span at least one second. Raised at
    /// construction time, never discovered later as a runtime fault.
    #[error("Invalid window length: {0} (must be > 0 seconds)")]
    InvalidWindowLength(u32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn worker thread '{name}': {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
