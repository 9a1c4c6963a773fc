//! Observability infrastructure for the watcher
//!
//! Provides:
//! - Prometheus metrics (per-query latency and failures, usage gauges)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge_vec,
    HistogramVec, IntCounter, IntCounterVec, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::classifier::{classified_percentages, Severity, UsageSummary};
use crate::models::AllUsage;

/// Histogram buckets for remote query latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<WatcherMetricsInner> = OnceLock::new();

struct WatcherMetricsInner {
    query_latency_seconds: HistogramVec,
    query_errors: IntCounterVec,
    usage_percentage: IntGaugeVec,
    snapshots: IntCounter,
}

impl WatcherMetricsInner {
    fn new() -> Self {
        Self {
            query_latency_seconds: register_histogram_vec!(
                "tier_watcher_query_latency_seconds",
                "Time spent on one provider usage query",
                &["query"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register query_latency_seconds"),

            query_errors: register_int_counter_vec!(
                "tier_watcher_query_errors_total",
                "Provider usage queries that failed",
                &["query"]
            )
            .expect("Failed to register query_errors_total"),

            usage_percentage: register_int_gauge_vec!(
                "tier_watcher_usage_percentage",
                "Last observed free tier usage percentage per resource",
                &["resource"]
            )
            .expect("Failed to register usage_percentage"),

            snapshots: register_int_counter!(
                "tier_watcher_snapshots_total",
                "Usage snapshots collected"
            )
            .expect("Failed to register snapshots_total"),
        }
    }
}

/// Lightweight handle to the global metrics; clones share the same metrics
#[derive(Clone)]
pub struct WatcherMetrics {
    _private: (),
}

impl Default for WatcherMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl WatcherMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(WatcherMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &WatcherMetricsInner {
        GLOBAL_METRICS.get_or_init(WatcherMetricsInner::new)
    }

    pub fn observe_query_latency(&self, query: &str, duration_secs: f64) {
        self.inner()
            .query_latency_seconds
            .with_label_values(&[query])
            .observe(duration_secs);
    }

    pub fn inc_query_errors(&self, query: &str) {
        self.inner().query_errors.with_label_values(&[query]).inc();
    }

    /// Export the classified percentages of a finished snapshot
    pub fn record_snapshot(&self, usage: &AllUsage) {
        let inner = self.inner();
        inner.snapshots.inc();
        for (resource, percentage) in classified_percentages(usage) {
            inner
                .usage_percentage
                .with_label_values(&[resource])
                .set(percentage);
        }
    }
}

/// Renders all registered metrics in the Prometheus text format
pub fn gather_text() -> Result<String, prometheus::Error> {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Structured logger for watcher events
#[derive(Clone)]
pub struct StructuredLogger {
    region: String,
}

impl StructuredLogger {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    pub fn log_startup(&self, version: &str, port: u16, configured: bool) {
        info!(
            event = "watcher_started",
            region = %self.region,
            version = %version,
            port = port,
            configured = configured,
            "Free tier watcher started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "watcher_shutdown",
            region = %self.region,
            reason = %reason,
            "Free tier watcher shutting down"
        );
    }

    pub fn log_query_failure(&self, query: &str, error: &str) {
        warn!(
            event = "query_failed",
            region = %self.region,
            query = %query,
            error = %error,
            "Usage query failed"
        );
    }

    pub fn log_snapshot(&self, summary: &UsageSummary) {
        match summary.status {
            Severity::Warning | Severity::Critical => {
                warn!(
                    event = "usage_snapshot",
                    region = %self.region,
                    status = %summary.status,
                    max_usage_percentage = summary.max_usage_percentage,
                    warnings = ?summary.warnings,
                    "Free tier usage close to limits"
                );
            }
            _ => {
                info!(
                    event = "usage_snapshot",
                    region = %self.region,
                    status = %summary.status,
                    max_usage_percentage = summary.max_usage_percentage,
                    "Free tier usage collected"
                );
            }
        }
    }
}
