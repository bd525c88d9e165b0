//! Prometheus metrics for the dashboard service
//!
//! Recording goes through the `metrics` facade and is a no-op until
//! [`init_metrics`] installs the exporter.

use std::fmt;
use std::net::SocketAddr;
use tracing::{info, warn};

/// All metric names used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RequestsTotal,
    RecordsServed,
    LoadErrors,
    LoadDuration,
}

impl MetricName {
    pub const ALL: [MetricName; 4] = [
        MetricName::RequestsTotal,
        MetricName::RecordsServed,
        MetricName::LoadErrors,
        MetricName::LoadDuration,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            MetricName::RequestsTotal => "btc_dashboard_requests_total",
            MetricName::RecordsServed => "btc_dashboard_records_served_total",
            MetricName::LoadErrors => "btc_dashboard_load_errors_total",
            MetricName::LoadDuration => "btc_dashboard_load_duration_seconds",
        }
    }

    pub const fn help(self) -> &'static str {
        match self {
            MetricName::RequestsTotal => "Requests to the balances endpoint by status code",
            MetricName::RecordsServed => "Normalized records returned to clients",
            MetricName::LoadErrors => "Failed loads of the CSV export",
            MetricName::LoadDuration => "Time spent reading and normalizing the CSV export",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            describe_metrics();
            info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => {
            warn!("Prometheus exporter install failed (possibly already installed): {}", e);
        }
    }
}

fn describe_metrics() {
    for name in MetricName::ALL {
        match name {
            MetricName::LoadDuration => {
                ::metrics::describe_histogram!(name.as_str(), ::metrics::Unit::Seconds, name.help())
            }
            _ => ::metrics::describe_counter!(name.as_str(), name.help()),
        }
    }
}

pub fn record_request(status: u16) {
    ::metrics::counter!(MetricName::RequestsTotal.as_str(), "status" => status.to_string())
        .increment(1);
}

pub fn record_records_served(count: usize) {
    ::metrics::counter!(MetricName::RecordsServed.as_str()).increment(count as u64);
}

pub fn record_load_success(elapsed_secs: f64) {
    ::metrics::histogram!(MetricName::LoadDuration.as_str()).record(elapsed_secs);
}

pub fn record_load_error() {
    ::metrics::counter!(MetricName::LoadErrors.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_naming_convention() {
        for name in MetricName::ALL {
            assert!(name.as_str().starts_with("btc_dashboard_"));
            assert!(!name.help().is_empty());
        }
        assert!(MetricName::RequestsTotal.as_str().ends_with("_total"));
        assert!(MetricName::LoadDuration.as_str().ends_with("_seconds"));
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_request(200);
        record_records_served(3);
        record_load_success(0.01);
        record_load_error();
    }
}
