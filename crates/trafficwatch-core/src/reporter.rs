//! Periodic statistics reporting.
//!
//! Every interval the reporter aggregates the last interval's worth of
//! traffic and renders a fixed-template text report (totals, QPS, and top-K
//! rankings for sections, users, and client IPs). The latest report is held
//! for pull-style consumers; rendering never blocks readers of the previous
//! report.

use crate::error::Result;
use crate::repository::StatsRepository;
use crate::stats::AggregatedStats;
use crate::worker::PeriodicWorker;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

pub struct StatsReporter {
    interval_secs: u32,
    top_k: usize,
    repository: Arc<StatsRepository>,
    latest: RwLock<Option<String>>,
    worker: Mutex<Option<PeriodicWorker>>,
}

impl StatsReporter {
    #[must_use]
    pub fn new(interval_secs: u32, top_k: usize, repository: Arc<StatsRepository>) -> Self {
        Self {
            interval_secs,
            top_k,
            repository,
            latest: RwLock::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Start the reporting timer; the first report renders immediately.
    /// Idempotent.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let mut worker = self.lock_worker();
        if worker.is_some() {
            return Ok(());
        }
        let reporter = Arc::clone(self);
        *worker = Some(PeriodicWorker::spawn(
            "stats-reporter",
            Duration::from_secs(u64::from(self.interval_secs)),
            move || reporter.tick(),
        )?);
        Ok(())
    }

    /// Stop the reporting timer. The last rendered report stays readable.
    /// Idempotent.
    pub fn stop(&self) {
        if let Some(mut worker) = self.lock_worker().take() {
            worker.stop();
        }
    }

    /// The most recent report, or `None` before the first render.
    #[must_use]
    pub fn latest_report(&self) -> Option<String> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn tick(&self) {
        let statistics = self.repository.aggregate(self.interval_secs);
        let report = self.format_report(&statistics);
        tracing::debug!(
            total = statistics.total_requests(),
            "rendered statistics report"
        );
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(report);
    }

    fn format_report(&self, statistics: &AggregatedStats) -> String {
        format!(
            "Traffic statistic in last {} second:\n\
             Total Requests: {}, QPS: {:.2}\n\
             Top {k} sections:\n{}\
             Top {k} auth:\n{}\
             Top {k} client IP:\n{}",
            self.interval_secs,
            statistics.total_requests(),
            statistics.qps(),
            format_ranking(statistics.sections().top_k(self.top_k)),
            format_ranking(statistics.users().top_k(self.top_k)),
            format_ranking(statistics.client_ips().top_k(self.top_k)),
            k = self.top_k,
        )
    }

    fn lock_worker(&self) -> std::sync::MutexGuard<'_, Option<PeriodicWorker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for StatsReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsReporter")
            .field("interval_secs", &self.interval_secs)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

/// Render a ranking as indented `key: count` lines; empty rankings render
/// as an empty block so the section header still appears.
fn format_ranking(entries: Vec<(String, u64)>) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let body = entries
        .iter()
        .map(|(key, count)| format!("{key}: {count}"))
        .collect::<Vec<_>>()
        .join("\n\t");
    format!("\t{body}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogRecord;
    use std::time::Instant;

    fn repository_with_traffic(now: i64) -> Arc<StatsRepository> {
        let repository = StatsRepository::new(120).expect("window length is positive");
        for (path, section, user, ip) in [
            ("/api/users", "/api", "james", "127.0.0.1"),
            ("/api/posts", "/api", "james", "127.0.0.1"),
            ("/report", "/report", "jill", "10.0.0.4"),
        ] {
            repository.add_record(&LogRecord::new(path, now, section, user, ip));
        }
        repository.into()
    }

    #[test]
    fn report_includes_totals_qps_and_rankings() {
        let now = chrono::Utc::now().timestamp();
        let reporter = StatsReporter::new(10, 5, repository_with_traffic(now));
        let statistics = reporter.repository.aggregate(10);
        let report = reporter.format_report(&statistics);

        assert!(report.starts_with("Traffic statistic in last 10 second:\n"));
        assert!(report.contains("Total Requests: 3, QPS: 0.30\n"));
        assert!(report.contains("Top 5 sections:\n\t/api: 2\n\t/report: 1\n"));
        assert!(report.contains("Top 5 auth:\n\tjames: 2\n\tjill: 1\n"));
        assert!(report.contains("Top 5 client IP:\n\t127.0.0.1: 2\n\t10.0.0.4: 1\n"));
    }

    #[test]
    fn empty_window_renders_headers_with_empty_rankings() {
        let repository = StatsRepository::new(120).expect("window length is positive");
        let reporter = StatsReporter::new(10, 5, Arc::new(repository));
        let report = reporter.format_report(&reporter.repository.aggregate(10));

        assert!(report.contains("Total Requests: 0, QPS: 0.00\n"));
        assert!(report.contains("Top 5 sections:\nTop 5 auth:\nTop 5 client IP:\n"));
    }

    #[test]
    fn ranking_is_truncated_to_top_k() {
        let now = chrono::Utc::now().timestamp();
        let repository = StatsRepository::new(120).expect("window length is positive");
        for section in ["/a", "/b", "/c"] {
            repository.add_record(&LogRecord::new(section, now, section, "u", "1.1.1.1"));
        }
        let reporter = StatsReporter::new(10, 2, Arc::new(repository));
        let report = reporter.format_report(&reporter.repository.aggregate(10));

        assert!(report.contains("Top 2 sections:\n\t/a: 1\n\t/b: 1\n"));
        assert!(!report.contains("/c: 1"));
    }

    #[test]
    fn started_reporter_publishes_a_report() {
        let now = chrono::Utc::now().timestamp();
        let reporter = Arc::new(StatsReporter::new(10, 5, repository_with_traffic(now)));
        assert!(reporter.latest_report().is_none());

        reporter.start().expect("reporter should start");
        let deadline = Instant::now() + Duration::from_secs(2);
        while reporter.latest_report().is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        let report = reporter
            .latest_report()
            .expect("first report should render immediately");
        assert!(report.starts_with("Traffic statistic"));
        reporter.stop();
    }
}
