//! Normalized caller identity.
//!
//! Whatever credential a request carried, once it has been vetted it is
//! reduced to an [`Identity`]: the trust method plus the user it speaks for.
//! Downstream code asks the identity, never the raw headers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the caller proved who it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Shared service secret presented directly
    ServiceSecret,
    /// OAuth access token
    AccessToken,
    /// Session token issued by the Auth service (user or server)
    SessionToken,
    /// Narrowly scoped, longer-lived user token
    RestrictedToken,
}

impl AuthMethod {
    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceSecret => "service_secret",
            Self::AccessToken => "access_token",
            Self::SessionToken => "session_token",
            Self::RestrictedToken => "restricted_token",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service_secret" => Ok(Self::ServiceSecret),
            "access_token" => Ok(Self::AccessToken),
            "session_token" => Ok(Self::SessionToken),
            "restricted_token" => Ok(Self::RestrictedToken),
            other => Err(format!("unknown auth method: {other}")),
        }
    }
}

/// Read-only view of a vetted caller.
///
/// The derived predicates are provided so that every implementation agrees
/// on what "service" and "user" mean.
pub trait Details: Send + Sync {
    /// Trust method used by the caller.
    fn method(&self) -> AuthMethod;

    /// User the request acts for; empty when no specific human is involved.
    fn user_id(&self) -> &str;

    /// Opaque credential presented by the caller.
    fn token(&self) -> &str;

    /// Optional role granted alongside the credential.
    fn role(&self) -> Option<&str>;

    /// A service (not a human) is calling.
    fn is_service(&self) -> bool {
        match self.method() {
            AuthMethod::ServiceSecret => true,
            AuthMethod::SessionToken => self.user_id().is_empty(),
            AuthMethod::AccessToken | AuthMethod::RestrictedToken => false,
        }
    }

    /// A human user is calling.
    fn is_user(&self) -> bool {
        !self.is_service()
    }

    /// The caller presented a forwardable token.
    fn has_token(&self) -> bool {
        self.method() != AuthMethod::ServiceSecret
    }
}

/// Immutable identity attached to a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    method: AuthMethod,
    user_id: String,
    token: String,
    role: Option<String>,
}

impl Identity {
    /// Create an identity. No validation happens here; the caller must
    /// already have vetted the credential.
    #[must_use]
    pub fn new(method: AuthMethod, user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            method,
            user_id: user_id.into(),
            token: token.into(),
            role: None,
        }
    }

    /// Identity of a peer that presented the shared service secret.
    #[must_use]
    pub fn service_secret() -> Self {
        Self::new(AuthMethod::ServiceSecret, "", "")
    }

    /// Identity backed by a session token. An empty `user_id` denotes a
    /// server session.
    #[must_use]
    pub fn session(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(AuthMethod::SessionToken, user_id, token)
    }

    /// Attach a role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Alias of [`Details::is_service`] used for session validation results.
    #[must_use]
    pub fn is_server(&self) -> bool {
        self.is_service()
    }
}

impl Details for Identity {
    fn method(&self) -> AuthMethod {
        self.method
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn token(&self) -> &str {
        &self.token
    }

    fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_session_is_service() {
        let identity = Identity::session("", "server-token");
        assert!(identity.is_service());
        assert!(identity.is_server());
        assert!(!identity.is_user());
        assert!(identity.has_token());
    }

    #[test]
    fn test_user_session_is_user() {
        let identity = Identity::session("u1", "user-token");
        assert!(identity.is_user());
        assert!(!identity.is_service());
        assert_eq!(identity.user_id(), "u1");
    }

    #[test]
    fn test_service_secret_has_no_token() {
        let identity = Identity::service_secret();
        assert!(identity.is_service());
        assert!(!identity.has_token());
        assert_eq!(identity.method(), AuthMethod::ServiceSecret);
    }

    #[test]
    fn test_restricted_token_without_user_is_still_user() {
        let identity = Identity::new(AuthMethod::RestrictedToken, "", "rt");
        assert!(identity.is_user());
        assert!(identity.has_token());
    }

    #[test]
    fn test_role() {
        let identity = Identity::session("u1", "t").with_role("clinic");
        assert_eq!(identity.role(), Some("clinic"));
        assert_eq!(Identity::session("u1", "t").role(), None);
    }

    #[test]
    fn test_method_names() {
        for method in [
            AuthMethod::ServiceSecret,
            AuthMethod::AccessToken,
            AuthMethod::SessionToken,
            AuthMethod::RestrictedToken,
        ] {
            assert_eq!(method.as_str().parse::<AuthMethod>(), Ok(method));
        }
        assert!("password".parse::<AuthMethod>().is_err());
        assert_eq!(
            serde_json::to_string(&AuthMethod::RestrictedToken).unwrap(),
            "\"restricted_token\""
        );
    }
}
