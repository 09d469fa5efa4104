//! Sliding-window statistics repository.
//!
//! A fixed-length ring buffer holds one statistics bucket per second; the
//! slot for second `t` is `t mod window`. Eviction is lazy: a slot is only
//! valid when the stored bucket's timestamp equals the second being visited,
//! so wrapped-around (stale) data is ignored on read and physically
//! overwritten on the next write to that slot. There is no purge pass and no
//! allocation proportional to event count.

use crate::error::{Error, Result};
use crate::metrics::global_metrics;
use crate::record::LogRecord;
use crate::stats::{AggregatedStats, SecondStats};
use std::sync::{Mutex, PoisonError};

/// Repository of per-second traffic statistics for a sliding time window.
///
/// All public operations serialize on one mutex: concurrent `add_record`
/// calls cannot corrupt a bucket, and a concurrent aggregate query always
/// observes fully-updated buckets. Query results are built inside the
/// critical section and returned by value; callers never hold references to
/// live buckets.
#[derive(Debug)]
pub struct StatsRepository {
    window_secs: u32,
    slots: Mutex<Vec<Option<SecondStats>>>,
}

impl StatsRepository {
    /// Construct a repository covering the last `window_secs` seconds.
    pub fn new(window_secs: u32) -> Result<Self> {
        if window_secs == 0 {
            return Err(Error::InvalidWindowLength(window_secs));
        }
        Ok(Self {
            window_secs,
            slots: Mutex::new(vec![None; window_secs as usize]),
        })
    }

    #[must_use]
    pub const fn window_secs(&self) -> u32 {
        self.window_secs
    }

    /// Ingest one record into the bucket for its second.
    ///
    /// Records with an absent timestamp, a future timestamp, or a timestamp
    /// older than the window are silently dropped; that protects window
    /// integrity from clock skew and backfill without surfacing noise.
    pub fn add_record(&self, record: &LogRecord) {
        self.add_record_at(record, epoch_now());
    }

    fn add_record_at(&self, record: &LogRecord, now: i64) {
        let Some(timestamp) = record.timestamp else {
            global_metrics().ingest.records_dropped.inc();
            return;
        };
        if !self.inside_window(timestamp, now) {
            global_metrics().ingest.records_dropped.inc();
            return;
        }
        let index = self.slot_index(timestamp);
        let mut slots = self.lock_slots();
        let bucket = match &mut slots[index] {
            Some(bucket) if bucket.timestamp() == timestamp => bucket,
            slot => slot.insert(SecondStats::new(timestamp)),
        };
        bucket.update(record);
        drop(slots);
        global_metrics().ingest.records_accepted.inc();
    }

    /// Aggregate statistics over the last `last_secs` seconds, clamped to
    /// the window length. Walks at most `window_secs` slots.
    #[must_use]
    pub fn aggregate(&self, last_secs: u32) -> AggregatedStats {
        self.aggregate_at(last_secs, epoch_now())
    }

    fn aggregate_at(&self, last_secs: u32, now: i64) -> AggregatedStats {
        let span = last_secs.min(self.window_secs);
        let mut aggregate = AggregatedStats::new(span);
        let slots = self.lock_slots();
        for timestamp in walk_backward(now, span) {
            if let Some(bucket) = &slots[self.slot_index(timestamp)]
                && bucket.timestamp() == timestamp
            {
                aggregate.absorb(bucket);
            }
        }
        aggregate
    }

    /// Total request count over the last `last_secs` seconds.
    ///
    /// Same walk as [`Self::aggregate`] but accumulates only the scalar
    /// total, skipping counter merges; cheap enough for the alert machine to
    /// call on every ingest and every poll.
    #[must_use]
    pub fn total_requests(&self, last_secs: u32) -> u64 {
        self.total_requests_at(last_secs, epoch_now())
    }

    fn total_requests_at(&self, last_secs: u32, now: i64) -> u64 {
        let span = last_secs.min(self.window_secs);
        let mut total = 0;
        let slots = self.lock_slots();
        for timestamp in walk_backward(now, span) {
            if let Some(bucket) = &slots[self.slot_index(timestamp)]
                && bucket.timestamp() == timestamp
            {
                total += bucket.requests();
            }
        }
        total
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, Vec<Option<SecondStats>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn slot_index(&self, timestamp: i64) -> usize {
        timestamp.rem_euclid(i64::from(self.window_secs)) as usize
    }

    fn inside_window(&self, timestamp: i64, now: i64) -> bool {
        timestamp <= now && timestamp > now - i64::from(self.window_secs)
    }
}

/// The `span` seconds ending at `now`, newest first.
fn walk_backward(now: i64, span: u32) -> impl Iterator<Item = i64> {
    (0..i64::from(span)).map(move |offset| now - offset)
}

fn epoch_now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl crate::alert::TrafficTotals for StatsRepository {
    fn total_requests(&self, last_secs: u32) -> u64 {
        Self::total_requests(self, last_secs)
    }
}
