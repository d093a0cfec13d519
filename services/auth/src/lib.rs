//! Auth Service - service credential lifecycle and caller identity.
//!
//! This crate keeps the service's own server-to-server credential fresh,
//! validates inbound session tokens against the Auth service, models the
//! identity of a caller, and runs the device authorization workflow that
//! pairs push-only devices with user accounts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod headers;
pub mod identity;
pub mod metrics;
pub mod server_token;
pub mod service;
pub mod session;
pub mod shutdown;

pub use config::{Config, ConfigError, ServiceInfo};
pub use error::{AuthError, ErrorCode, ErrorResponse};
pub use service::AuthService;
