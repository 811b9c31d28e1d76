// crates/server/src/metrics.rs
//! Prometheus metrics: recorder initialization, metric descriptions, and
//! the `/metrics` render handler, grounded in the source repository's
//! own metrics module.

use std::sync::OnceLock;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Returns `false` if a
/// recorder was already installed (idempotent, safe to call from tests).
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("failed to set global metrics recorder (already set)");
        return false;
    }
    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("failed to store Prometheus handle (already set)");
    }

    describe_metrics();
    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!("activity_requests_total", "Total number of API requests by endpoint and status");
    describe_histogram!("activity_request_duration_seconds", "Duration of API requests in seconds");
    describe_histogram!("activity_aggregation_duration_seconds", "Duration of session aggregation passes");
    describe_gauge!("activity_aggregator_backlog", "Number of due jobs claimed but not yet completed");
    describe_histogram!("activity_notifier_send_duration_seconds", "Duration of chat notifier delivery attempts");
}

pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub fn record_request(endpoint: &str, status: &str, duration: std::time::Duration) {
    counter!("activity_requests_total", "endpoint" => endpoint.to_string(), "status" => status.to_string()).increment(1);
    histogram!("activity_request_duration_seconds", "endpoint" => endpoint.to_string()).record(duration.as_secs_f64());
}

pub fn record_aggregation(duration: std::time::Duration) {
    histogram!("activity_aggregation_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_backlog(size: u64) {
    gauge!("activity_aggregator_backlog").set(size as f64);
}

pub fn record_notifier_send(duration: std::time::Duration) {
    histogram!("activity_notifier_send_duration_seconds").record(duration.as_secs_f64());
}

/// Times a request handler; call `finish_ok`/`finish_err` on the way out.
pub struct RequestTimer {
    endpoint: String,
    start: Instant,
}

impl RequestTimer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), start: Instant::now() }
    }

    pub fn finish_ok(self) {
        record_request(&self.endpoint, "200", self.start.elapsed());
    }

    pub fn finish(self, status: u16) {
        record_request(&self.endpoint, &status.to_string(), self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_timer_records_without_panicking() {
        let timer = RequestTimer::new("test_endpoint");
        std::thread::sleep(std::time::Duration::from_millis(1));
        timer.finish_ok();
    }

    #[test]
    fn render_metrics_is_none_before_init() {
        let _ = render_metrics();
    }
}
