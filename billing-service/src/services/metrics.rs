//! Prometheus metrics for billing-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// HTTP request counter by method, route and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "billing_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register http_requests_total")
});

/// HTTP request duration histogram by method and route.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "billing_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register http_request_duration")
});

/// Bill lifecycle counter by event.
pub static BILLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "billing_bills_total",
        "Total number of bill events",
        &["event"] // created, paid
    )
    .expect("Failed to register bills_total")
});

/// Net amount billed, by event.
pub static BILL_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "billing_bill_amount_total",
        "Total net amount of bills",
        &["event"]
    )
    .expect("Failed to register bill_amount_total")
});

/// Authentication failures by reason.
pub static AUTH_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "billing_auth_failures_total",
        "Total number of rejected authentication attempts",
        &["reason"]
    )
    .expect("Failed to register auth_failures_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "billing_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION);
    Lazy::force(&BILLS_TOTAL);
    Lazy::force(&BILL_AMOUNT_TOTAL);
    Lazy::force(&AUTH_FAILURES_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Record a bill event (`created` or `paid`) and its net amount.
pub fn record_bill(event: &str, net_amount: Decimal) {
    BILLS_TOTAL.with_label_values(&[event]).inc();
    if let Some(amount) = net_amount.to_f64() {
        if amount >= 0.0 {
            BILL_AMOUNT_TOTAL.with_label_values(&[event]).inc_by(amount);
        }
    }
}

pub fn record_auth_failure(reason: &str) {
    AUTH_FAILURES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_bills_show_up_in_export() {
        init_metrics();
        record_bill("created", Decimal::new(53159, 2));

        let text = get_metrics();
        assert!(text.contains("billing_bills_total"));
        assert!(text.contains("billing_bill_amount_total"));
    }

    #[test]
    fn http_requests_are_labelled_by_route() {
        record_http_request("GET", "/api/items", 200, 0.002);
        let count = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/items", "200"])
            .get();
        assert!(count >= 1.0);
    }
}
