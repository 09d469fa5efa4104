//! High-traffic alert state machine.
//!
//! Entry is event-driven: every accepted record triggers a threshold check,
//! so an alert fires on the exact record that crosses the line. Exit is
//! polled: a 1-second timer re-reads the window total and clears the alert
//! once it drops back under the threshold. While alerting, the event-driven
//! check early-outs, leaving recovery entirely to the timer — firing must be
//! immediate but recovery tolerates up to ~1 s of latency.

use crate::error::Result;
use crate::metrics::global_metrics;
use crate::worker::PeriodicWorker;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

const RECOVERY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// The one read the alert machine needs from the statistics repository.
/// Kept as a trait so tests can script totals without a live window.
pub trait TrafficTotals: Send + Sync {
    /// Total request count over the trailing `last_secs` seconds.
    fn total_requests(&self, last_secs: u32) -> u64;
}

/// Flag and message move together: a reader can never observe a fresh flag
/// with a stale message.
#[derive(Debug, Default)]
struct AlertState {
    in_alert: bool,
    message: Option<String>,
}

pub struct TrafficAlert {
    threshold_per_sec: u32,
    window_secs: u32,
    totals: Arc<dyn TrafficTotals>,
    state: RwLock<AlertState>,
    poller: Mutex<Option<PeriodicWorker>>,
}

impl TrafficAlert {
    /// `threshold_per_sec` and `window_secs` define the trigger product:
    /// the alert fires when the trailing-window total reaches
    /// `threshold_per_sec * window_secs`.
    #[must_use]
    pub fn new(threshold_per_sec: u32, window_secs: u32, totals: Arc<dyn TrafficTotals>) -> Self {
        Self {
            threshold_per_sec,
            window_secs,
            totals,
            state: RwLock::new(AlertState::default()),
            poller: Mutex::new(None),
        }
    }

    /// Event-driven check, called once per accepted record.
    ///
    /// At most one transition fires per threshold crossing: concurrent
    /// callers race to the write lock and only the first observes
    /// `in_alert == false`.
    pub fn on_record(&self) {
        if self.read_state().in_alert {
            return;
        }
        let total = self.totals.total_requests(self.window_secs);
        if total < self.threshold_total() {
            return;
        }
        let mut state = self.write_state();
        if state.in_alert {
            return;
        }
        state.in_alert = true;
        state.message = Some(format!(
            "High traffic generated an alert - hits = {total}, triggered at {}",
            format_now()
        ));
        drop(state);
        global_metrics().alert.alerts_fired.inc();
        tracing::info!(total, "high traffic alert fired");
    }

    /// Poll-driven recovery check; the only path out of the alerting state.
    fn recovery_tick(&self) {
        if !self.read_state().in_alert {
            return;
        }
        let total = self.totals.total_requests(self.window_secs);
        if total >= self.threshold_total() {
            return;
        }
        let mut state = self.write_state();
        if !state.in_alert {
            return;
        }
        state.in_alert = false;
        state.message = Some(format!(
            "High traffic recovered - hits = {total}, recovered at {}",
            format_now()
        ));
        drop(state);
        global_metrics().alert.recoveries.inc();
        tracing::info!(total, "high traffic alert recovered");
    }

    /// Start the once-per-second recovery poller. Idempotent.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let mut poller = self.lock_poller();
        if poller.is_some() {
            return Ok(());
        }
        let alert = Arc::clone(self);
        *poller = Some(PeriodicWorker::spawn(
            "traffic-alert",
            RECOVERY_POLL_INTERVAL,
            move || alert.recovery_tick(),
        )?);
        Ok(())
    }

    /// Stop the recovery poller, draining the in-flight tick. Idempotent.
    pub fn stop(&self) {
        if let Some(mut worker) = self.lock_poller().take() {
            worker.stop();
        }
    }

    /// Whether the machine is currently alerting. Never blocks on the
    /// poller; only on in-flight state writes.
    #[must_use]
    pub fn in_alert(&self) -> bool {
        self.read_state().in_alert
    }

    /// The message recorded at the most recent transition (alert or
    /// recovery); `None` until the first alert fires.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.read_state().message.clone()
    }

    fn threshold_total(&self) -> u64 {
        u64::from(self.threshold_per_sec) * u64::from(self.window_secs)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, AlertState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, AlertState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_poller(&self) -> std::sync::MutexGuard<'_, Option<PeriodicWorker>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TrafficAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficAlert")
            .field("threshold_per_sec", &self.threshold_per_sec)
            .field("window_secs", &self.window_secs)
            .field("in_alert", &self.in_alert())
            .finish_non_exhaustive()
    }
}

fn format_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Instant;

    const THRESHOLD_PER_SEC: u32 = 10;
    const WINDOW_SECS: u32 = 10;

    /// Scripted total source: returns the stored value on every read.
    struct ScriptedTotals {
        total: AtomicU64,
    }

    impl ScriptedTotals {
        fn new(total: u64) -> Arc<Self> {
            Arc::new(Self {
                total: AtomicU64::new(total),
            })
        }

        fn set(&self, total: u64) {
            self.total.store(total, Ordering::Relaxed);
        }
    }

    impl TrafficTotals for ScriptedTotals {
        fn total_requests(&self, _last_secs: u32) -> u64 {
            self.total.load(Ordering::Relaxed)
        }
    }

    fn alert_with(totals: &Arc<ScriptedTotals>) -> TrafficAlert {
        TrafficAlert::new(
            THRESHOLD_PER_SEC,
            WINDOW_SECS,
            Arc::clone(totals) as Arc<dyn TrafficTotals>,
        )
    }

    #[test]
    fn below_threshold_never_alerts() {
        let totals = ScriptedTotals::new(99);
        let alert = alert_with(&totals);
        alert.on_record();
        assert!(!alert.in_alert());
        assert!(alert.message().is_none());
    }

    #[test]
    fn threshold_crossing_fires_exactly_once() {
        let totals = ScriptedTotals::new(100);
        let alert = alert_with(&totals);

        alert.on_record();
        assert!(alert.in_alert());
        let message = alert.message().expect("alert message should be recorded");
        assert!(message.contains("hits = 100"), "message: {message}");

        // A second check with no intervening drop must not re-fire or
        // rewrite the message.
        alert.on_record();
        assert!(alert.in_alert());
        assert_eq!(alert.message().as_deref(), Some(message.as_str()));
    }

    #[test]
    fn concurrent_crossings_fire_a_single_transition() {
        let totals = ScriptedTotals::new(1_000);
        let alert = Arc::new(alert_with(&totals));
        let fired_before = global_metrics().alert.alerts_fired.load();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let alert = Arc::clone(&alert);
                scope.spawn(move || alert.on_record());
            }
        });

        assert!(alert.in_alert());
        assert_eq!(global_metrics().alert.alerts_fired.load(), fired_before + 1);
    }

    #[test]
    fn recovery_tick_clears_the_alert_and_records_a_message() {
        let totals = ScriptedTotals::new(100);
        let alert = alert_with(&totals);
        alert.on_record();
        assert!(alert.in_alert());

        // Still at the threshold: the poll must not clear.
        alert.recovery_tick();
        assert!(alert.in_alert());

        totals.set(99);
        alert.recovery_tick();
        assert!(!alert.in_alert());
        let message = alert.message().expect("recovery message should be recorded");
        assert!(message.contains("recovered"), "message: {message}");
        assert!(message.contains("hits = 99"), "message: {message}");
    }

    #[test]
    fn recovery_tick_is_a_no_op_when_not_alerting() {
        let totals = ScriptedTotals::new(0);
        let alert = alert_with(&totals);
        alert.recovery_tick();
        assert!(!alert.in_alert());
        assert!(alert.message().is_none());
    }

    #[test]
    fn poller_recovers_within_about_a_second() {
        let totals = ScriptedTotals::new(100);
        let alert = Arc::new(alert_with(&totals));
        alert.start().expect("poller should start");

        alert.on_record();
        assert!(alert.in_alert());

        totals.set(99);
        let deadline = Instant::now() + Duration::from_secs(3);
        while alert.in_alert() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(!alert.in_alert(), "poller should have cleared the alert");
        alert.stop();
    }

    #[test]
    fn start_is_idempotent() {
        let totals = ScriptedTotals::new(0);
        let alert = Arc::new(alert_with(&totals));
        alert.start().expect("first start should succeed");
        alert.start().expect("second start should be a no-op");
        alert.stop();
        alert.stop();
    }
}
