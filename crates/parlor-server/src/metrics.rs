//! Metrics collection and export for Parlor.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const REGISTRATIONS_TOTAL: &str = "parlor_registrations_total";
    pub const PARTICIPANTS_ACTIVE: &str = "parlor_participants_active";
    pub const MESSAGES_TOTAL: &str = "parlor_messages_total";
    pub const HEARTBEATS_TOTAL: &str = "parlor_heartbeats_total";
    pub const EVICTIONS_TOTAL: &str = "parlor_evictions_total";
    pub const SWEEP_FAILURES_TOTAL: &str = "parlor_sweep_failures_total";
    pub const LATENCY_SECONDS: &str = "parlor_request_latency_seconds";
    pub const ERRORS_TOTAL: &str = "parlor_errors_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::REGISTRATIONS_TOTAL,
        "Total number of successful participant registrations"
    );
    metrics::describe_gauge!(
        names::PARTICIPANTS_ACTIVE,
        "Current number of registered participants"
    );
    metrics::describe_counter!(names::MESSAGES_TOTAL, "Total number of messages sent by type");
    metrics::describe_counter!(names::HEARTBEATS_TOTAL, "Total number of accepted heartbeats");
    metrics::describe_counter!(
        names::EVICTIONS_TOTAL,
        "Total number of participants evicted for inactivity"
    );
    metrics::describe_counter!(
        names::SWEEP_FAILURES_TOTAL,
        "Total number of failed sweep cycles"
    );
    metrics::describe_histogram!(
        names::LATENCY_SECONDS,
        "Request processing latency in seconds"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of errors by kind");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a registration.
pub fn record_registration() {
    counter!(names::REGISTRATIONS_TOTAL).increment(1);
    gauge!(names::PARTICIPANTS_ACTIVE).increment(1.0);
}

/// Record a sent message.
pub fn record_message(kind: &str) {
    counter!(names::MESSAGES_TOTAL, "type" => kind.to_string()).increment(1);
}

/// Record an accepted heartbeat.
pub fn record_heartbeat() {
    counter!(names::HEARTBEATS_TOTAL).increment(1);
}

/// Record participants removed by a sweep.
pub fn record_evictions(count: u64) {
    if count > 0 {
        counter!(names::EVICTIONS_TOTAL).increment(count);
        gauge!(names::PARTICIPANTS_ACTIVE).decrement(count as f64);
    }
}

/// Record a failed sweep cycle.
pub fn record_sweep_failure() {
    counter!(names::SWEEP_FAILURES_TOTAL).increment(1);
}

/// Set the participant gauge, e.g. after restoring a snapshot.
pub fn set_active_participants(count: u64) {
    gauge!(names::PARTICIPANTS_ACTIVE).set(count as f64);
}

/// Record request latency.
pub fn record_latency(route: &'static str, seconds: f64) {
    histogram!(names::LATENCY_SECONDS, "route" => route).record(seconds);
}

/// Record an error.
pub fn record_error(kind: &str) {
    counter!(names::ERRORS_TOTAL, "kind" => kind.to_string()).increment(1);
}

/// Records the latency of a request when dropped.
pub struct LatencyGuard {
    route: &'static str,
    start: std::time::Instant,
}

impl LatencyGuard {
    /// Start timing a request on `route`.
    #[must_use]
    pub fn new(route: &'static str) -> Self {
        Self {
            route,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for LatencyGuard {
    fn drop(&mut self) {
        record_latency(self.route, self.start.elapsed().as_secs_f64());
    }
}
