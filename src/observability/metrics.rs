//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Aggregate per-route request counts and latency distributions
//! - Keep exactly one series per (method, route, status) key
//! - Expose Prometheus-compatible text for the scrape endpoint
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by service, method, path, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `build_info` (gauge): constant 1, labelled with service/version/build_time
//!
//! # Design Decisions
//! - The key table is a sharded concurrent map; a missing key is created
//!   under the shard's write lock so concurrent first writers share one entry
//! - Entries are never evicted; label cardinality is bounded by `RouteLabel`
//! - The recorder is owned by the registry instead of being installed as
//!   the process-global recorder, so every server (and test) gets its own

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use metrics::{Counter, Histogram, Key, Label, Level, Metadata, Recorder};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use thiserror::Error;

use crate::config::ServiceInfo;
use crate::routing::RouteLabel;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const BUILD_INFO: &str = "build_info";

/// Latency buckets in seconds, 1ms to 60s.
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to configure metrics exporter: {0}")]
    Exporter(#[from] BuildError),
}

/// Identity of one request series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub method: Method,
    pub route: RouteLabel,
    pub status: u16,
}

/// Counter and latency histogram for one [`MetricKey`].
pub struct MetricEntry {
    count: AtomicU64,
    requests: Counter,
    latency: Histogram,
}

impl MetricEntry {
    fn register(recorder: &PrometheusRecorder, service: &str, key: &MetricKey) -> Self {
        let labels = vec![
            Label::new("service", service.to_string()),
            Label::new("method", key.method.to_string()),
            Label::new("path", key.route.as_str().to_string()),
            Label::new("status", key.status.to_string()),
        ];

        let requests = recorder.register_counter(
            &Key::from_parts(HTTP_REQUESTS_TOTAL, labels.clone()),
            &metadata(),
        );
        let latency = recorder.register_histogram(
            &Key::from_parts(HTTP_REQUEST_DURATION_SECONDS, labels),
            &metadata(),
        );

        Self {
            count: AtomicU64::new(0),
            requests,
            latency,
        }
    }

    fn observe(&self, elapsed: Duration) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.requests.increment(1);
        self.latency.record(elapsed.as_secs_f64());
    }

    /// Number of requests observed for this key.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Per-route request metrics.
pub struct MetricsRegistry {
    service: String,
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    entries: DashMap<MetricKey, Arc<MetricEntry>>,
}

impl MetricsRegistry {
    pub fn new(info: &ServiceInfo) -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
                LATENCY_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();

        recorder.describe_counter(
            HTTP_REQUESTS_TOTAL.into(),
            None,
            "Total number of HTTP requests processed.".into(),
        );
        recorder.describe_histogram(
            HTTP_REQUEST_DURATION_SECONDS.into(),
            None,
            "HTTP request latencies in seconds.".into(),
        );
        recorder.describe_gauge(
            BUILD_INFO.into(),
            None,
            "Build information for the service.".into(),
        );

        let build_info = recorder.register_gauge(
            &Key::from_parts(
                BUILD_INFO,
                vec![
                    Label::new("service", info.name.clone()),
                    Label::new("version", info.version.clone()),
                    Label::new("build_time", info.build_time.clone()),
                ],
            ),
            &metadata(),
        );
        build_info.set(1.0);

        Ok(Self {
            service: info.name.clone(),
            recorder,
            handle,
            entries: DashMap::new(),
        })
    }

    /// Count one finished request and record its latency.
    pub fn record(&self, method: &Method, route: &RouteLabel, status: u16, elapsed: Duration) {
        let key = MetricKey {
            method: method.clone(),
            route: route.clone(),
            status,
        };
        self.entry(key).observe(elapsed);
    }

    /// Look up the entry for `key`, creating it on first use.
    fn entry(&self, key: MetricKey) -> Arc<MetricEntry> {
        if let Some(existing) = self.entries.get(&key) {
            return Arc::clone(existing.value());
        }

        match self.entries.entry(key) {
            Entry::Occupied(occupied) => Arc::clone(occupied.get()),
            Entry::Vacant(vacant) => {
                let created = Arc::new(MetricEntry::register(&self.recorder, &self.service, vacant.key()));
                tracing::debug!(
                    method = %vacant.key().method,
                    path = %vacant.key().route,
                    status = vacant.key().status,
                    "metric_series_created"
                );
                vacant.insert(Arc::clone(&created));
                created
            }
        }
    }

    /// Requests counted so far for one key (0 if never seen).
    pub fn count(&self, method: &Method, route: &RouteLabel, status: u16) -> u64 {
        let key = MetricKey {
            method: method.clone(),
            route: route.clone(),
            status,
        };
        self.entries.get(&key).map(|e| e.count()).unwrap_or(0)
    }

    /// Snapshot of every series and its count.
    pub fn series(&self) -> Vec<(MetricKey, u64)> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().count()))
            .collect()
    }

    /// Number of distinct series.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prometheus text exposition of everything recorded.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
