//! Shared library for cross-cutting concerns in auth-platform Rust services.
//!
//! This crate provides centralized implementations for:
//! - Error types with retryability classification
//! - HTTP client configuration and building
//! - Refresh scheduling with exponential failure backoff
//! - Tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod retry;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, build_http_client};
pub use retry::{BackoffConfig, FIRST_FAILURE_BACKOFF, FailureBackoff, MAX_FAILURE_BACKOFF};
pub use tracing_config::{TracingConfig, init_tracing};
