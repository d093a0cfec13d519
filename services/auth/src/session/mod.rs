//! Inbound session token validation.

pub mod validator;

pub use validator::{SessionTokenValidator, TokenValidator};
