//! String frequency counting with deterministic top-K extraction.

use serde::Serialize;
use std::collections::HashMap;

/// Counts occurrences of string keys.
///
/// The top-K ordering (count descending, ties by ascending key) is a
/// published contract: downstream report formatting and tests depend on the
/// exact tie order, so it must be reproducible regardless of the underlying
/// map's iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrequencyCounter {
    counts: HashMap<String, u64>,
}

impl FrequencyCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `key` by 1. Empty keys are a no-op.
    pub fn increase(&mut self, key: &str) {
        if key.is_empty() {
            return;
        }
        self.add(key, 1);
    }

    fn add(&mut self, key: &str, count: u64) {
        if let Some(existing) = self.counts.get_mut(key) {
            *existing += count;
        } else {
            self.counts.insert(key.to_string(), count);
        }
    }

    /// Fold every key of `other` into this counter, summing counts.
    /// Commutative and associative; merging an empty counter is a no-op.
    pub fn merge(&mut self, other: &Self) {
        for (key, count) in &other.counts {
            self.add(key, *count);
        }
    }

    /// Exact count recorded for `key` (0 if never seen).
    #[must_use]
    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// The `min(k, len)` highest-frequency entries, sorted by count
    /// descending with ties broken by ascending key order.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(k);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increase_counts_each_call() {
        let mut counter = FrequencyCounter::new();
        counter.increase("/api");
        counter.increase("/api");
        counter.increase("/report");
        assert_eq!(counter.count("/api"), 2);
        assert_eq!(counter.count("/report"), 1);
        assert_eq!(counter.count("/missing"), 0);
    }

    #[test]
    fn empty_key_is_a_no_op() {
        let mut counter = FrequencyCounter::new();
        counter.increase("");
        assert!(counter.is_empty());
        assert_eq!(counter.len(), 0);
    }

    #[test]
    fn top_k_orders_by_count_then_key() {
        let mut counter = FrequencyCounter::new();
        for _ in 0..3 {
            counter.increase("b");
        }
        for _ in 0..3 {
            counter.increase("a");
        }
        counter.increase("c");
        assert_eq!(
            counter.top_k(2),
            vec![("a".to_string(), 3), ("b".to_string(), 3)]
        );
    }

    #[test]
    fn top_k_larger_than_distinct_keys_returns_all() {
        let mut counter = FrequencyCounter::new();
        counter.increase("x");
        counter.increase("y");
        assert_eq!(counter.top_k(10).len(), 2);
    }

    #[test]
    fn top_k_zero_is_empty() {
        let mut counter = FrequencyCounter::new();
        counter.increase("x");
        assert!(counter.top_k(0).is_empty());
    }

    #[test]
    fn merge_sums_counts_key_wise() {
        let mut left = FrequencyCounter::new();
        left.increase("a");
        left.increase("b");
        let mut right = FrequencyCounter::new();
        right.increase("b");
        right.increase("c");

        left.merge(&right);
        assert_eq!(left.count("a"), 1);
        assert_eq!(left.count("b"), 2);
        assert_eq!(left.count("c"), 1);
    }

    #[test]
    fn merging_empty_counter_is_identity() {
        let mut counter = FrequencyCounter::new();
        counter.increase("a");
        counter.increase("a");
        let before = counter.clone();

        counter.merge(&FrequencyCounter::new());
        assert_eq!(counter, before);
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut counter = FrequencyCounter::new();
        counter.increase("/api");
        let json = serde_json::to_value(&counter).expect("counter should serialize");
        assert_eq!(json["/api"], 1);
    }
}
