//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method and dispatch outcome
//! - `router_dispatch_duration_seconds` (histogram): time from dispatch to response
//! - `router_routes` (gauge): routes in the live table
//! - `router_reloads_total` (counter): configuration reloads by result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Histogram buckets tuned for typical web latencies

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

const DURATION_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full("router_dispatch_duration_seconds".to_string()),
            DURATION_BUCKETS,
        )?
        .install()?;

    describe_counter!(
        "router_requests_total",
        "Total requests by method and dispatch outcome"
    );
    describe_histogram!(
        "router_dispatch_duration_seconds",
        "Time spent dispatching and answering a request"
    );
    describe_gauge!("router_routes", "Routes in the live route table");
    describe_counter!("router_reloads_total", "Configuration reloads by result");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_dispatch(method: &str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("router_dispatch_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

pub fn record_route_count(count: usize) {
    gauge!("router_routes").set(count as f64);
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("router_reloads_total", "result" => result).increment(1);
}
