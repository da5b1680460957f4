use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static EMAILS_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "salemanager_emails_sent_total",
        "Emails delivered (or simulated) successfully"
    )
    .expect("register emails_sent_total")
});

pub static EMAILS_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "salemanager_emails_failed_total",
        "Emails whose delivery attempt failed"
    )
    .expect("register emails_failed_total")
});

pub static LEADS_CONVERTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "salemanager_leads_converted_total",
        "Leads converted into customers"
    )
    .expect("register leads_converted_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    // Touch the lazies so every series is exported even before first use.
    Lazy::force(&EMAILS_SENT_TOTAL);
    Lazy::force(&EMAILS_FAILED_TOTAL);
    Lazy::force(&LEADS_CONVERTED_TOTAL);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
