//! Lock-free operational counters for the ingest and alert paths.
//!
//! Hot-path recording is O(1) with no locks; snapshotting is plain relaxed
//! loads. Intentionally lightweight so every crate can record.

use serde::Serialize;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counter {
    v: AtomicU64,
}

impl Counter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            v: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn inc(&self) {
        self.v.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(&self, delta: u64) {
        self.v.fetch_add(delta, Ordering::Relaxed);
    }

    #[inline]
    pub fn load(&self) -> u64 {
        self.v.load(Ordering::Relaxed)
    }
}

/// Counters for the line-ingest path.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Raw lines delivered by the tailer.
    pub lines_total: Counter,
    /// Lines that failed the CLF grammar.
    pub lines_malformed: Counter,
    /// Records accepted into the window.
    pub records_accepted: Counter,
    /// Records dropped (absent, future, or out-of-window timestamp).
    pub records_dropped: Counter,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestMetricsSnapshot {
    pub lines_total: u64,
    pub lines_malformed: u64,
    pub records_accepted: u64,
    pub records_dropped: u64,
}

impl IngestMetrics {
    #[must_use]
    pub fn snapshot(&self) -> IngestMetricsSnapshot {
        IngestMetricsSnapshot {
            lines_total: self.lines_total.load(),
            lines_malformed: self.lines_malformed.load(),
            records_accepted: self.records_accepted.load(),
            records_dropped: self.records_dropped.load(),
        }
    }
}

/// Counters for alert state transitions.
#[derive(Debug, Default)]
pub struct AlertMetrics {
    pub alerts_fired: Counter,
    pub recoveries: Counter,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertMetricsSnapshot {
    pub alerts_fired: u64,
    pub recoveries: u64,
}

impl AlertMetrics {
    #[must_use]
    pub fn snapshot(&self) -> AlertMetricsSnapshot {
        AlertMetricsSnapshot {
            alerts_fired: self.alerts_fired.load(),
            recoveries: self.recoveries.load(),
        }
    }
}

#[derive(Debug, Default)]
pub struct GlobalMetrics {
    pub ingest: IngestMetrics,
    pub alert: AlertMetrics,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GlobalMetricsSnapshot {
    pub ingest: IngestMetricsSnapshot,
    pub alert: AlertMetricsSnapshot,
}

impl GlobalMetrics {
    #[must_use]
    pub fn snapshot(&self) -> GlobalMetricsSnapshot {
        GlobalMetricsSnapshot {
            ingest: self.ingest.snapshot(),
            alert: self.alert.snapshot(),
        }
    }
}

static GLOBAL_METRICS: LazyLock<GlobalMetrics> = LazyLock::new(GlobalMetrics::default);

#[must_use]
pub fn global_metrics() -> &'static GlobalMetrics {
    &GLOBAL_METRICS
}
