//! Production observability metrics for the campaign exporter
//!
//! Tracks cache effectiveness, queue pressure, upstream outcomes and export
//! results.
//!
//! ## Architecture
//!
//! - Uses `metrics` crate for low-overhead metric collection
//! - Prometheus exporter for scraping endpoint (opt-in, e.g. `:9090/metrics`)
//! - Recording is a no-op until [`init_metrics`] installs the exporter

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls are ignored once the exporter is installed.
///
/// # Arguments
/// * `addr` - Socket address to bind Prometheus scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "cache_lookups_total",
        Unit::Count,
        "Response cache lookups by resource and result"
    );

    describe_counter!(
        "upstream_requests_total",
        Unit::Count,
        "Requests dispatched to the campaign provider by resource and outcome"
    );

    describe_histogram!(
        "upstream_request_duration_seconds",
        Unit::Seconds,
        "Transport call duration in seconds"
    );

    describe_histogram!(
        "gateway_queue_wait_seconds",
        Unit::Seconds,
        "Time from enqueue to dispatch in seconds"
    );

    describe_gauge!(
        "gateway_queue_depth",
        Unit::Count,
        "Requests waiting in the gateway queue"
    );

    describe_counter!(
        "exports_completed_total",
        Unit::Count,
        "Exports that produced a spreadsheet"
    );

    describe_counter!("exports_failed_total", Unit::Count, "Exports that failed");

    describe_counter!(
        "export_analytics_unavailable_total",
        Unit::Count,
        "Per-campaign analytics fetches downgraded to unavailable"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Record a cache lookup for `resource`
pub fn record_cache_lookup(resource: &str, hit: bool) {
    counter!(
        "cache_lookups_total",
        "resource" => resource.to_string(),
        "result" => if hit { "hit" } else { "miss" },
    )
    .increment(1);
}

/// Record a completed transport call
pub fn record_upstream_request(resource: &str, outcome: &'static str, duration: Duration) {
    counter!(
        "upstream_requests_total",
        "resource" => resource.to_string(),
        "outcome" => outcome,
    )
    .increment(1);

    histogram!(
        "upstream_request_duration_seconds",
        "resource" => resource.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record how long a request sat in the queue before dispatch
pub fn record_queue_wait(wait: Duration) {
    histogram!("gateway_queue_wait_seconds").record(wait.as_secs_f64());
}

/// Update the queue depth gauge
pub fn set_queue_depth(depth: usize) {
    gauge!("gateway_queue_depth").set(depth as f64);
}

/// Export run metrics
pub struct ExportMetrics {
    client_label: String,
    start_time: Instant,
}

impl ExportMetrics {
    /// Start tracking an export run
    pub fn start(client_label: impl Into<String>, campaigns: usize) -> Self {
        let client_label = client_label.into();

        info!(
            client = %client_label,
            campaigns = campaigns,
            "Export started"
        );

        Self {
            client_label,
            start_time: Instant::now(),
        }
    }

    /// Record campaigns whose analytics could not be fetched
    pub fn record_unavailable(&self, count: usize) {
        if count > 0 {
            counter!("export_analytics_unavailable_total").increment(count as u64);
        }
    }

    /// Record successful export
    pub fn record_success(&self, filename: &str, rows: usize) {
        counter!("exports_completed_total").increment(1);

        info!(
            client = %self.client_label,
            filename = %filename,
            rows = rows,
            duration_ms = self.start_time.elapsed().as_millis() as u64,
            "Export completed successfully"
        );
    }

    /// Record failed export
    pub fn record_failure(&self, error: &str) {
        counter!("exports_failed_total").increment(1);

        error!(
            client = %self.client_label,
            error = %error,
            duration_ms = self.start_time.elapsed().as_millis() as u64,
            "Export failed"
        );
    }
}
