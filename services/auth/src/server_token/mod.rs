//! This service's own server-to-server credential.

pub mod login;
pub mod manager;

pub use login::{HttpServerLogin, ServerLogin};
pub use manager::ServerTokenManager;

use crate::error::AuthError;

/// Source of the credential used on outbound service-to-service calls.
pub trait ServerToken: Send + Sync {
    /// Current server credential.
    fn server_token(&self) -> Result<String, AuthError>;
}
