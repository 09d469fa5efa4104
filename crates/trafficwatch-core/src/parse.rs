//! Common Log Format line parsing.
//!
//! One anchored regex pulls the CLF fields apart; timestamp and section are
//! derived afterwards. A line that does not match the grammar yields `None`
//! and is counted as malformed. Field-level oddities (unparseable timestamp,
//! request path with no section) degrade to `None` fields on an otherwise
//! valid record rather than rejecting the whole line.

use crate::metrics::global_metrics;
use crate::record::LogRecord;
use regex::Regex;
use std::sync::LazyLock;

// host ident auth [timestamp] "METHOD path proto" status bytes
static CLF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<client>\S+) (?P<ident>\S+) (?P<auth>\S+) \[(?P<timestamp>[^\]]+)\] "(?P<method>\S+) (?P<path>\S+)(?: (?P<proto>[^"]+))?" (?P<status>\d{3}) (?P<bytes>\d+|-)\s*$"#,
    )
    .expect("CLF pattern is valid")
});

/// Parse one access-log line into a [`LogRecord`].
///
/// Returns `None` for lines that do not match the CLF grammar.
#[must_use]
pub fn parse_line(line: &str) -> Option<LogRecord> {
    global_metrics().ingest.lines_total.inc();
    let Some(captures) = CLF_RE.captures(line) else {
        global_metrics().ingest.lines_malformed.inc();
        tracing::debug!(line, "discarding malformed log line");
        return None;
    };

    let path = &captures["path"];
    Some(LogRecord {
        request: path.to_string(),
        timestamp: parse_timestamp(&captures["timestamp"]),
        section: parse_section(path),
        auth: dash_is_absent(&captures["auth"]),
        client_ip: dash_is_absent(&captures["client"]),
    })
}

/// Parse a CLF timestamp (`09/May/2018:16:00:39 +0000`) to epoch seconds.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    chrono::DateTime::parse_from_str(raw, "%d/%b/%Y:%H:%M:%S %z")
        .map(|dt| dt.timestamp())
        .ok()
}

/// Extract the section of a request path: `"/"` plus everything before the
/// second `/`. `/api/users` and `/api` both belong to section `/api`; paths
/// not starting with `/`, and the bare root, have no section.
#[must_use]
pub fn parse_section(path: &str) -> Option<String> {
    let rest = path.strip_prefix('/')?;
    let first = rest.split('/').next().unwrap_or("");
    if first.is_empty() {
        return None;
    }
    Some(format!("/{first}"))
}

/// CLF writes `-` for a missing field; normalize it to an absent value.
fn dash_is_absent(field: &str) -> Option<String> {
    if field == "-" {
        None
    } else {
        Some(field.to_string())
    }
}
