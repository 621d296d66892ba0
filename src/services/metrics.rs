//! Prometheus metrics.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, HistogramVec,
    IntCounterVec,
};

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "dealroom_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Password gate checks by outcome
pub static GATE_CHECKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "dealroom_gate_checks_total",
            "Password gate checks by outcome"
        ),
        &["outcome"]
    )
    .expect("Failed to register GATE_CHECKS_TOTAL")
});

/// Rate-limited requests by bucket
pub static RATE_LIMITED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "dealroom_rate_limited_total",
            "Requests denied by rate limiting, per bucket"
        ),
        &["bucket"]
    )
    .expect("Failed to register RATE_LIMITED_TOTAL")
});

/// Vault operations by outcome
pub static VAULT_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "dealroom_vault_requests_total",
            "Vault operations by operation and outcome"
        ),
        &["operation", "outcome"]
    )
    .expect("Failed to register VAULT_REQUESTS_TOTAL")
});

/// Access requests by outcome
pub static ACCESS_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "dealroom_access_requests_total",
            "Access upgrade requests by outcome"
        ),
        &["outcome"]
    )
    .expect("Failed to register ACCESS_REQUESTS_TOTAL")
});
