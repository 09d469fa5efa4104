//! Monitoring facade: tailer, repository, alert, and reporter under one
//! lifecycle.

use crate::tail::LogTailer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use trafficwatch_core::alert::TrafficTotals;
use trafficwatch_core::metrics::GlobalMetricsSnapshot;
use trafficwatch_core::{
    Config, Result, StatsReporter, StatsRepository, TrafficAlert, global_metrics, parse_line,
};

/// Owns every moving part of a monitoring session.
///
/// `start` brings the pieces up in dependency order (alert and reporter
/// before the tailer, so no record arrives without a consumer); `stop`
/// tears them down in reverse. Both are idempotent.
pub struct TrafficMonitor {
    config: Config,
    repository: Arc<StatsRepository>,
    alert: Arc<TrafficAlert>,
    reporter: Arc<StatsReporter>,
    tailer: Mutex<Option<LogTailer>>,
    running: AtomicBool,
}

impl TrafficMonitor {
    /// Build a monitor from a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let repository = Arc::new(StatsRepository::new(config.window_secs)?);
        let alert = Arc::new(TrafficAlert::new(
            config.alert_threshold_qps,
            config.window_secs,
            Arc::clone(&repository) as Arc<dyn TrafficTotals>,
        ));
        let reporter = Arc::new(StatsReporter::new(
            config.report_interval_secs,
            config.top_k,
            Arc::clone(&repository),
        ));
        Ok(Self {
            config,
            repository,
            alert,
            reporter,
            tailer: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// Start the alert poller, the reporter, and the tailer.
    pub fn start(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }
        tracing::info!(
            log_file = %self.config.log_file.display(),
            window_secs = self.config.window_secs,
            report_interval_secs = self.config.report_interval_secs,
            alert_threshold_qps = self.config.alert_threshold_qps,
            "starting traffic monitor"
        );
        self.alert.start()?;
        self.reporter.start()?;

        let repository = Arc::clone(&self.repository);
        let alert = Arc::clone(&self.alert);
        let tailer = LogTailer::spawn(&self.config.log_file, move |line| {
            if let Some(record) = parse_line(line) {
                repository.add_record(&record);
                alert.on_record();
            }
        });
        match tailer {
            Ok(tailer) => {
                *self.lock_tailer() = Some(tailer);
                Ok(())
            }
            Err(error) => {
                self.reporter.stop();
                self.alert.stop();
                self.running.store(false, Ordering::Release);
                Err(error)
            }
        }
    }

    /// Stop the tailer first so no new records arrive, then the reporter
    /// and alert poller.
    pub fn stop(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        if let Some(mut tailer) = self.lock_tailer().take() {
            tailer.stop();
        }
        self.reporter.stop();
        self.alert.stop();
        tracing::info!("traffic monitor stopped");
    }

    /// The most recent statistics report, if one has rendered yet.
    #[must_use]
    pub fn latest_report(&self) -> Option<String> {
        self.reporter.latest_report()
    }

    /// Whether the high-traffic alert is currently firing.
    #[must_use]
    pub fn in_alert(&self) -> bool {
        self.alert.in_alert()
    }

    /// The message from the most recent alert transition.
    #[must_use]
    pub fn alert_message(&self) -> Option<String> {
        self.alert.message()
    }

    /// Point-in-time view of the ingest and alert counters.
    #[must_use]
    pub fn metrics(&self) -> GlobalMetricsSnapshot {
        global_metrics().snapshot()
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn repository(&self) -> &StatsRepository {
        &self.repository
    }

    fn lock_tailer(&self) -> std::sync::MutexGuard<'_, Option<LogTailer>> {
        self.tailer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TrafficMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TrafficMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficMonitor")
            .field("config", &self.config)
            .field("running", &self.running.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
