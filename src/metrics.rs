//! Here we expose prometheus metrics about pushbell
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Response},
};
use once_cell::sync::Lazy;
use prometheus::{opts, register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

/// total number of deserialized alerts, by severity label
pub static RECEIVED_ALERTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("received_alerts", "total number of deserialized alerts")
            .namespace("pushbell")
            .subsystem("webhook"),
        &["severity"]
    )
    .unwrap()
});

/// push delivery attempts by result (`sent` / `failed`)
pub static NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("notifications_total", "push notification delivery attempts")
            .namespace("pushbell")
            .subsystem("pushbullet"),
        &["result"]
    )
    .unwrap()
});

pub async fn metrics_handler() -> Response<Body> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    Response::builder()
        .status(200)
        .header(CONTENT_TYPE, encoder.format_type())
        .body(Body::from(buffer))
        .unwrap()
}
