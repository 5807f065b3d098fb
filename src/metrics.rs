// Metrics and observability module
// This file handles collection and reporting of router operation counts,
// latencies and routed volume
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

pub static OP_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "router_operation_latency_seconds",
        "latency of router operations",
        &["op"]
    )
    .expect("register router_operation_latency_seconds")
});

pub static OP_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "router_operations_total",
        "router operations by outcome",
        &["op", "outcome"]
    )
    .expect("register router_operations_total")
});

pub static ROUTED_VOLUME: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "router_routed_volume_total",
        "asset units moved through the router",
        &["op"]
    )
    .expect("register router_routed_volume_total")
});

pub fn record_outcome<T>(op: &str, result: &Result<T, RouterError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    OP_TOTAL.with_label_values(&[op, outcome]).inc();
}

pub fn record_volume(op: &str, amount: u128) {
    // precision loss above 2^53 is fine for a dashboard counter
    ROUTED_VOLUME.with_label_values(&[op]).inc_by(amount as f64);
}

/// Prometheus text exposition of the default registry.
pub fn render() -> String {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&prometheus::gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
