use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

pub static OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "jsondir_ops_total",
        "Collection operations by result",
        &["op", "result"]
    )
    .unwrap()
});

pub static OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "jsondir_op_duration_seconds",
        "Collection operation latency",
        &["op"]
    )
    .unwrap()
});

pub fn record(op: &str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    OPS_TOTAL.with_label_values(&[op, result]).inc();
}

/// Prometheus text exposition of the default registry.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    let _ = encoder.encode(&prometheus::gather(), &mut buf);
    String::from_utf8(buf).unwrap_or_default()
}
