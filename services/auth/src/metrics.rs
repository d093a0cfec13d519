//! Prometheus metrics for the auth subsystem.

use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, register_int_counter_vec};

/// Server token refresh attempts.
pub static SERVER_TOKEN_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "auth_service_server_token_refresh_total",
        "Total number of server token refresh attempts",
        &["status"]
    )
    .expect("Failed to register server_token_refresh metric")
});

/// Session token validations by outcome.
pub static SESSION_VALIDATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "auth_service_session_validations_total",
        "Total number of session token validations",
        &["outcome"]
    )
    .expect("Failed to register session_validations metric")
});

/// Device authorization lifecycle events.
pub static DEVICE_AUTHORIZATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "auth_service_device_authorizations_total",
        "Total number of device authorization events",
        &["event"]
    )
    .expect("Failed to register device_authorizations metric")
});

/// Record a server token refresh attempt.
pub fn record_refresh(succeeded: bool) {
    let status = if succeeded { "success" } else { "failure" };
    SERVER_TOKEN_REFRESHES.with_label_values(&[status]).inc();
}

/// Record a session validation outcome (`user`, `server`, `unauthorized`, ...).
pub fn record_session_validation(outcome: &str) {
    SESSION_VALIDATIONS.with_label_values(&[outcome]).inc();
}

/// Record a device authorization event (`created`, `confirmed`, `mismatch`, ...).
pub fn record_device_event(event: &str) {
    DEVICE_AUTHORIZATIONS.with_label_values(&[event]).inc();
}
