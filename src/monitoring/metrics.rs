//! Lightweight metric primitives with Prometheus text export.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Default latency buckets, in seconds.
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Sorted `(name, value)` pairs identifying one series of a family.
pub type LabelKey = Vec<(String, String)>;

#[derive(Debug, Default, Clone)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A value that can go up and down.
#[derive(Debug, Default, Clone)]
pub struct Gauge {
    value: Arc<AtomicI64>,
}

impl Gauge {
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Cumulative histogram over fixed upper bounds.
#[derive(Debug, Clone)]
pub struct Histogram {
    bounds: Arc<[f64]>,
    buckets: Arc<[AtomicU64]>,
    /// Sum of observations in micro-units
    sum: Arc<AtomicU64>,
    count: Arc<AtomicU64>,
}

impl Histogram {
    pub fn with_buckets(bounds: &[f64]) -> Self {
        Self {
            bounds: bounds.into(),
            buckets: bounds.iter().map(|_| AtomicU64::new(0)).collect(),
            sum: Arc::new(AtomicU64::new(0)),
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn observe(&self, value: f64) {
        let value = value.max(0.0);
        self.sum
            .fetch_add((value * 1_000_000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (bound, bucket) in self.bounds.iter().zip(self.buckets.iter()) {
            if value <= *bound {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> f64 {
        self.sum.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    pub fn bucket_counts(&self) -> Vec<(f64, u64)> {
        self.bounds
            .iter()
            .zip(self.buckets.iter())
            .map(|(bound, count)| (*bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_buckets(LATENCY_BUCKETS)
    }
}

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    key.sort();
    key
}

/// A counter family keyed by label set.
#[derive(Debug, Default, Clone)]
pub struct LabeledCounter {
    entries: Arc<RwLock<BTreeMap<LabelKey, Counter>>>,
}

impl LabeledCounter {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.inc_by(labels, 1);
    }

    pub fn inc_by(&self, labels: &[(&str, &str)], n: u64) {
        let key = label_key(labels);

        if let Some(counter) = self.entries.read().get(&key) {
            counter.inc_by(n);
            return;
        }

        self.entries.write().entry(key).or_default().inc_by(n);
    }

    /// Current value for `labels`, zero if never incremented.
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.entries
            .read()
            .get(&label_key(labels))
            .map(Counter::get)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> Vec<(LabelKey, u64)> {
        self.entries
            .read()
            .iter()
            .map(|(labels, counter)| (labels.clone(), counter.get()))
            .collect()
    }
}

/// A histogram family keyed by label set.
#[derive(Debug, Default, Clone)]
pub struct LabeledHistogram {
    entries: Arc<RwLock<BTreeMap<LabelKey, Histogram>>>,
}

impl LabeledHistogram {
    pub fn observe(&self, labels: &[(&str, &str)], value: f64) {
        let key = label_key(labels);

        if let Some(histogram) = self.entries.read().get(&key) {
            histogram.observe(value);
            return;
        }

        self.entries
            .write()
            .entry(key)
            .or_default()
            .observe(value);
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.entries
            .read()
            .get(&label_key(labels))
            .map(Histogram::count)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> Vec<(LabelKey, Histogram)> {
        self.entries
            .read()
            .iter()
            .map(|(labels, histogram)| (labels.clone(), histogram.clone()))
            .collect()
    }
}

/// Format label pairs as a Prometheus label string: `{key1="val1",key2="val2"}`
pub fn format_labels(labels: &[(String, String)]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect();
    format!("{{{}}}", parts.join(","))
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Append the `# HELP` and `# TYPE` header of a metric family.
pub fn write_header(out: &mut String, name: &str, kind: &str, help: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

pub fn write_labeled_counter(out: &mut String, name: &str, help: &str, family: &LabeledCounter) {
    write_header(out, name, "counter", help);
    for (labels, value) in family.entries() {
        let _ = writeln!(out, "{}{} {}", name, format_labels(&labels), value);
    }
}

pub fn write_gauge(out: &mut String, name: &str, help: &str, gauge: &Gauge) {
    write_header(out, name, "gauge", help);
    let _ = writeln!(out, "{} {}", name, gauge.get());
}

pub fn write_labeled_histogram(
    out: &mut String,
    name: &str,
    help: &str,
    family: &LabeledHistogram,
) {
    write_header(out, name, "histogram", help);
    for (labels, histogram) in family.entries() {
        for (bound, count) in histogram.bucket_counts() {
            let mut bucket_labels = labels.clone();
            bucket_labels.push(("le".to_string(), bound.to_string()));
            let _ = writeln!(out, "{}_bucket{} {}", name, format_labels(&bucket_labels), count);
        }
        let mut inf_labels = labels.clone();
        inf_labels.push(("le".to_string(), "+Inf".to_string()));
        let _ = writeln!(
            out,
            "{}_bucket{} {}",
            name,
            format_labels(&inf_labels),
            histogram.count()
        );
        let label_str = format_labels(&labels);
        let _ = writeln!(out, "{}_sum{} {}", name, label_str, histogram.sum());
        let _ = writeln!(out, "{}_count{} {}", name, label_str, histogram.count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_buckets_are_cumulative() {
        let histogram = Histogram::with_buckets(&[0.1, 1.0]);
        histogram.observe(0.05);
        histogram.observe(0.5);
        histogram.observe(3.0);

        assert_eq!(histogram.bucket_counts(), vec![(0.1, 1), (1.0, 2)]);
        assert_eq!(histogram.count(), 3);
        assert!((histogram.sum() - 3.55).abs() < 1e-6);
    }

    #[test]
    fn test_label_order_does_not_matter() {
        let counter = LabeledCounter::default();
        counter.inc(&[("a", "1"), ("b", "2")]);
        counter.inc(&[("b", "2"), ("a", "1")]);

        assert_eq!(counter.get(&[("a", "1"), ("b", "2")]), 2);
        assert_eq!(counter.entries().len(), 1);
    }

    #[test]
    fn test_format_labels_escapes_quotes() {
        let labels = vec![("path".to_string(), "say \"hi\"".to_string())];
        assert_eq!(format_labels(&labels), r#"{path="say \"hi\""}"#);
        assert_eq!(format_labels(&[]), "");
    }
}
