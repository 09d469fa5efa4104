//! Per-second statistics buckets and window aggregates.

use crate::counter::FrequencyCounter;
use crate::record::LogRecord;
use serde::Serialize;

/// One second's worth of raw statistics: a total plus one frequency counter
/// per dimension. Created lazily the first time a record lands on a second;
/// the second it represents never changes, the contents do.
#[derive(Debug, Clone)]
pub struct SecondStats {
    timestamp: i64,
    requests: u64,
    sections: FrequencyCounter,
    client_ips: FrequencyCounter,
    users: FrequencyCounter,
}

impl SecondStats {
    #[must_use]
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            requests: 0,
            sections: FrequencyCounter::new(),
            client_ips: FrequencyCounter::new(),
            users: FrequencyCounter::new(),
        }
    }

    /// Fold one record into this bucket. Absent fields are skipped, so a
    /// record missing e.g. the auth user still counts toward the total and
    /// the other dimensions.
    pub fn update(&mut self, record: &LogRecord) {
        if let Some(section) = &record.section {
            self.sections.increase(section);
        }
        if let Some(client_ip) = &record.client_ip {
            self.client_ips.increase(client_ip);
        }
        if let Some(auth) = &record.auth {
            self.users.increase(auth);
        }
        self.requests += 1;
    }

    /// Epoch second this bucket holds statistics for.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub const fn requests(&self) -> u64 {
        self.requests
    }

    #[must_use]
    pub const fn sections(&self) -> &FrequencyCounter {
        &self.sections
    }

    #[must_use]
    pub const fn client_ips(&self) -> &FrequencyCounter {
        &self.client_ips
    }

    #[must_use]
    pub const fn users(&self) -> &FrequencyCounter {
        &self.users
    }
}

/// Aggregate over a span of consecutive seconds. Built fresh on every
/// repository query and owned by the caller; never aliases live buckets.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedStats {
    span_secs: u32,
    total_requests: u64,
    sections: FrequencyCounter,
    client_ips: FrequencyCounter,
    users: FrequencyCounter,
}

impl AggregatedStats {
    #[must_use]
    pub fn new(span_secs: u32) -> Self {
        Self {
            span_secs,
            total_requests: 0,
            sections: FrequencyCounter::new(),
            client_ips: FrequencyCounter::new(),
            users: FrequencyCounter::new(),
        }
    }

    /// Merge one bucket's total and counters into this aggregate.
    pub fn absorb(&mut self, bucket: &SecondStats) {
        self.total_requests += bucket.requests();
        self.sections.merge(bucket.sections());
        self.client_ips.merge(bucket.client_ips());
        self.users.merge(bucket.users());
    }

    /// Requests per second over the span; 0.0 for an empty aggregate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn qps(&self) -> f64 {
        if self.total_requests == 0 || self.span_secs == 0 {
            return 0.0;
        }
        self.total_requests as f64 / f64::from(self.span_secs)
    }

    #[must_use]
    pub const fn span_secs(&self) -> u32 {
        self.span_secs
    }

    #[must_use]
    pub const fn total_requests(&self) -> u64 {
        self.total_requests
    }

    #[must_use]
    pub const fn sections(&self) -> &FrequencyCounter {
        &self.sections
    }

    #[must_use]
    pub const fn client_ips(&self) -> &FrequencyCounter {
        &self.client_ips
    }

    #[must_use]
    pub const fn users(&self) -> &FrequencyCounter {
        &self.users
    }
}
