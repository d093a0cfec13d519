//! Caller identity: the trust model and how requests acquire one.

pub mod authenticator;
pub mod context;
pub mod details;

pub use authenticator::Authenticator;
pub use context::RequestContext;
pub use details::{AuthMethod, Details, Identity};
