//! The parsed access-log event consumed by the statistics repository.

/// One parsed CLF access-log line.
///
/// Records have no identity beyond their fields; two equal records are
/// interchangeable for counting purposes. Fields that did not parse (or were
/// `-` in the log) are absent, and absent fields are silently skipped by the
/// counters downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// The request path as logged, e.g. `/api/users`.
    pub request: String,
    /// Epoch seconds of the log line; absent when the timestamp failed to
    /// parse (such records are dropped by the repository).
    pub timestamp: Option<i64>,
    /// First path segment, e.g. `/api` for `/api/users`.
    pub section: Option<String>,
    /// Authenticated user, `-` normalized to absent.
    pub auth: Option<String>,
    /// Client address.
    pub client_ip: Option<String>,
}

impl LogRecord {
    /// Build a record with all fields present, timestamped `timestamp`.
    /// Mostly useful for tests and synthetic traffic.
    #[must_use]
    pub fn new(
        request: impl Into<String>,
        timestamp: i64,
        section: impl Into<String>,
        auth: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        Self {
            request: request.into(),
            timestamp: Some(timestamp),
            section: Some(section.into()),
            auth: Some(auth.into()),
            client_ip: Some(client_ip.into()),
        }
    }
}
