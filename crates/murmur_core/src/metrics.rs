//! Metrics collection for the simulation.
//!
//! [`MetricStore`] keeps named series (accumulated or recorded) that are
//! reported through `tracing` on a fixed tick interval. Series registered as
//! periodic restart their statistics after each report.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Statistics of one named series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricValue {
    /// Number of accumulated samples. Zero for record-only series.
    pub count: u64,
    pub total: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub last: f64,
}

impl MetricValue {
    fn observe(&mut self, value: f64) {
        self.last = value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    metrics: BTreeMap<String, MetricValue>,
    periodic: BTreeSet<String>,
    total_calls: u64,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample to `name`'s running statistics.
    pub fn accumulate(&mut self, name: &str, value: f64) {
        self.total_calls += 1;
        let metric = self.metrics.entry(name.to_string()).or_default();
        metric.count += 1;
        metric.total += value;
        metric.observe(value);
    }

    pub fn increment(&mut self, name: &str) {
        self.accumulate(name, 1.0);
    }

    /// Like [`accumulate`](Self::accumulate), but the series restarts after every report.
    pub fn accumulate_periodic(&mut self, name: &str, value: f64) {
        if !self.periodic.contains(name) {
            self.periodic.insert(name.to_string());
        }
        self.accumulate(name, value);
    }

    /// Tracks last/min/max without counting toward totals.
    pub fn record(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().observe(value);
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.metrics.get(name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    /// Drops one series, or everything when `name` is `None`.
    pub fn reset(&mut self, name: Option<&str>) {
        match name {
            Some(name) => {
                self.metrics.remove(name);
                self.periodic.remove(name);
            }
            None => {
                self.metrics.clear();
                self.periodic.clear();
                self.total_calls = 0;
            }
        }
    }

    /// Logs every series, then restarts periodic ones (keeping their last value).
    pub fn report(&mut self) {
        tracing::info!(
            metrics = self.metrics.len(),
            total_calls = self.total_calls,
            "Metrics report"
        );
        for (name, metric) in &self.metrics {
            match metric.average() {
                Some(avg) => tracing::info!(
                    metric = %name,
                    total = metric.total,
                    avg = avg,
                    min = metric.min,
                    max = metric.max,
                    last = metric.last,
                    n = metric.count,
                    "Accumulated metric"
                ),
                None => tracing::info!(
                    metric = %name,
                    last = metric.last,
                    min = metric.min,
                    max = metric.max,
                    "Recorded metric"
                ),
            }
        }
        for name in &self.periodic {
            if let Some(metric) = self.metrics.get_mut(name) {
                *metric = MetricValue {
                    last: metric.last,
                    ..MetricValue::default()
                };
            }
        }
    }

    /// Every series as a JSON object keyed by name.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.metrics).unwrap_or(serde_json::Value::Null)
    }
}

/// Tick-level counters plus the named metric store.
pub struct Metrics {
    tick_count: u64,
    entity_count: usize,
    store: MetricStore,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            entity_count: 0,
            store: MetricStore::new(),
        }
    }

    /// Records a completed tick with its wall-clock duration.
    pub fn record_tick(&mut self, duration: Duration, entities: usize) {
        self.tick_count += 1;
        self.entity_count = entities;
        let ms = duration.as_secs_f64() * 1000.0;
        self.store.record("tick_ms", ms);
        self.store.accumulate_periodic("tick_total_ms", ms);

        if self.tick_count % 1000 == 0 {
            tracing::info!(
                tick = self.tick_count,
                entities = entities,
                duration_ms = duration.as_millis() as u64,
                "Simulation tick"
            );
        }
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MetricStore {
        &mut self.store
    }

    pub fn report(&mut self) {
        self.store.report();
    }
}

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_tracks_stats() {
        let mut store = MetricStore::new();
        store.accumulate("x", 2.0);
        store.accumulate("x", 4.0);
        let m = store.get("x").unwrap();
        assert_eq!(m.count, 2);
        assert_eq!(m.total, 6.0);
        assert_eq!(m.min, Some(2.0));
        assert_eq!(m.max, Some(4.0));
        assert_eq!(m.last, 4.0);
        assert_eq!(m.average(), Some(3.0));
        assert_eq!(store.total_calls(), 2);
    }

    #[test]
    fn test_record_does_not_count() {
        let mut store = MetricStore::new();
        store.record("pending", 5.0);
        store.record("pending", 1.0);
        let m = store.get("pending").unwrap();
        assert_eq!(m.count, 0);
        assert_eq!(m.average(), None);
        assert_eq!((m.min, m.max, m.last), (Some(1.0), Some(5.0), 1.0));
    }

    #[test]
    fn test_report_resets_periodic_only() {
        let mut store = MetricStore::new();
        store.accumulate_periodic("p", 3.0);
        store.accumulate("q", 3.0);
        store.report();
        let p = store.get("p").unwrap();
        assert_eq!(p.count, 0);
        assert_eq!(p.min, None);
        assert_eq!(p.last, 3.0);
        assert_eq!(store.get("q").unwrap().count, 1);
    }

    #[test]
    fn test_reset() {
        let mut store = MetricStore::new();
        store.increment("a");
        store.increment("b");
        store.reset(Some("a"));
        assert!(store.get("a").is_none());
        store.reset(None);
        assert!(store.is_empty());
        assert_eq!(store.total_calls(), 0);
    }

    #[test]
    fn test_json_snapshot() {
        let mut store = MetricStore::new();
        store.increment("spawned");
        let json = store.to_json();
        assert_eq!(json["spawned"]["count"], 1);
    }

    #[test]
    fn test_record_tick() {
        let mut metrics = Metrics::new();
        metrics.record_tick(Duration::from_millis(16), 100);
        assert_eq!(metrics.tick_count(), 1);
        assert_eq!(metrics.entity_count(), 100);
        assert!(metrics.store().get("tick_ms").is_some());
    }
}
