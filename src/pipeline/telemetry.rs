//! Pluggable audit telemetry
//!
//! The [`Auditor`](super::Auditor) reports lifecycle events, per-stage
//! durations and weight totals to a [`MetricsCollector`]. The default
//! collector does nothing; [`LogCollector`] forwards to the `log` facade and
//! [`MemoryCollector`] keeps everything for inspection in tests.

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;

/// Audit lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    /// Audit of one bundle started
    Started,
    /// Audit produced a result
    Completed,
    /// Audit stopped with a pipeline error
    Failed,
}

/// One recorded value
#[derive(Debug, Clone, PartialEq)]
pub struct MetricData {
    /// Metric name
    pub name: String,
    /// Value
    pub value: f64,
    /// Labels
    pub tags: BTreeMap<String, String>,
}

impl MetricData {
    /// Create an untagged metric
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            tags: BTreeMap::new(),
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Receiver for audit telemetry
pub trait MetricsCollector: Send + Sync {
    /// Collector name
    fn name(&self) -> &str;

    /// Record a lifecycle event for a bundle
    fn record_event(&self, event: AuditEvent, bundle: &str);

    /// Record a metric value
    fn record_metric(&self, metric: MetricData);

    /// Record how long a pipeline stage took
    fn record_stage(&self, bundle: &str, stage: &str, duration: Duration) {
        self.record_metric(
            MetricData::new(format!("{}_duration_us", stage), duration.as_micros() as f64)
                .with_tag("bundle", bundle)
                .with_tag("stage", stage),
        );
    }

    /// Record a byte total
    fn record_size(&self, bundle: &str, label: &str, size_bytes: u64) {
        self.record_metric(
            MetricData::new(format!("{}_bytes", label), size_bytes as f64)
                .with_tag("bundle", bundle)
                .with_tag("label", label),
        );
    }
}

/// Discards everything (default)
pub struct NoOpCollector;

impl MetricsCollector for NoOpCollector {
    fn name(&self) -> &str {
        "noop"
    }

    fn record_event(&self, _event: AuditEvent, _bundle: &str) {}

    fn record_metric(&self, _metric: MetricData) {}
}

/// Forwards to `log` at debug level
pub struct LogCollector;

impl MetricsCollector for LogCollector {
    fn name(&self) -> &str {
        "log"
    }

    fn record_event(&self, event: AuditEvent, bundle: &str) {
        log::debug!("[audit] {}: {:?}", bundle, event);
    }

    fn record_metric(&self, metric: MetricData) {
        log::debug!("[metric] {} = {} {:?}", metric.name, metric.value, metric.tags);
    }
}

/// Event with the bundle it concerns
type EventRecord = (AuditEvent, String);

/// Keeps everything in memory
#[derive(Default)]
pub struct MemoryCollector {
    events: Mutex<Vec<EventRecord>>,
    metrics: Mutex<Vec<MetricData>>,
}

impl MemoryCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().clone()
    }

    /// Recorded metrics, oldest first
    pub fn metrics(&self) -> Vec<MetricData> {
        self.metrics.lock().clone()
    }

    /// Metrics with the given name
    pub fn named(&self, name: &str) -> Vec<MetricData> {
        self.metrics
            .lock()
            .iter()
            .filter(|m| m.name == name)
            .cloned()
            .collect()
    }

    /// Drop all recorded data
    pub fn clear(&self) {
        self.events.lock().clear();
        self.metrics.lock().clear();
    }
}

impl MetricsCollector for MemoryCollector {
    fn name(&self) -> &str {
        "memory"
    }

    fn record_event(&self, event: AuditEvent, bundle: &str) {
        self.events.lock().push((event, bundle.to_string()));
    }

    fn record_metric(&self, metric: MetricData) {
        self.metrics.lock().push(metric);
    }
}
