//! Runtime configuration, loaded from environment variables.
//!
//! Every knob has a default suitable for watching a local access log; env
//! vars override field by field. Unparseable values fall back to the
//! default, but semantically invalid combinations (zero window, interval
//! longer than the window) are rejected by [`Config::validate`].

use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILE: &str = "/tmp/access.log";
pub const DEFAULT_WINDOW_SECS: u32 = 120;
pub const DEFAULT_REPORT_INTERVAL_SECS: u32 = 10;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_ALERT_THRESHOLD_QPS: u32 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    /// Access log file to tail.
    pub log_file: PathBuf,
    /// Sliding window length in seconds.
    pub window_secs: u32,
    /// Seconds between console statistics reports.
    pub report_interval_secs: u32,
    /// Number of entries shown per frequency ranking.
    pub top_k: usize,
    /// Average requests/second over the window that triggers the alert.
    pub alert_threshold_qps: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            window_secs: DEFAULT_WINDOW_SECS,
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
            top_k: DEFAULT_TOP_K,
            alert_threshold_qps: DEFAULT_ALERT_THRESHOLD_QPS,
        }
    }
}

impl Config {
    /// Load configuration from `TRAFFICWATCH_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            log_file: env_value("TRAFFICWATCH_LOG_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
            window_secs: env_u32("TRAFFICWATCH_WINDOW_SECS", DEFAULT_WINDOW_SECS),
            report_interval_secs: env_u32(
                "TRAFFICWATCH_REPORT_INTERVAL_SECS",
                DEFAULT_REPORT_INTERVAL_SECS,
            ),
            top_k: env_usize("TRAFFICWATCH_TOP_K", DEFAULT_TOP_K),
            alert_threshold_qps: env_u32(
                "TRAFFICWATCH_ALERT_THRESHOLD_QPS",
                DEFAULT_ALERT_THRESHOLD_QPS,
            ),
        }
    }

    /// Reject configurations the engine cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            return Err(Error::InvalidWindowLength(self.window_secs));
        }
        if self.report_interval_secs == 0 {
            return Err(Error::InvalidConfig(
                "report interval must be at least 1 second".to_string(),
            ));
        }
        if self.report_interval_secs > self.window_secs {
            return Err(Error::InvalidConfig(format!(
                "report interval ({}s) exceeds the window ({}s)",
                self.report_interval_secs, self.window_secs
            )));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidConfig(
                "top-k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_value(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_value(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_file, PathBuf::from("/tmp/access.log"));
        assert_eq!(config.window_secs, 120);
        assert_eq!(config.report_interval_secs, 10);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.alert_threshold_qps, 20);
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = Config {
            window_secs: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidWindowLength(0))
        ));
    }

    #[test]
    fn interval_longer_than_window_is_rejected() {
        let config = Config {
            window_secs: 10,
            report_interval_secs: 11,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_interval_and_zero_top_k_are_rejected() {
        let config = Config {
            report_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            top_k: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
