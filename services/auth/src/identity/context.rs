//! Request-scoped carrier for the resolved identity.

use crate::error::AuthError;
use crate::identity::Identity;
use uuid::Uuid;

/// Context handed from the routing layer to every auth operation of a
/// single request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: Uuid,
    identity: Option<Identity>,
}

impl RequestContext {
    /// Context with a fresh correlation ID and no identity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_correlation_id(Uuid::new_v4())
    }

    /// Context reusing a correlation ID received from the caller.
    #[must_use]
    pub const fn with_correlation_id(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            identity: None,
        }
    }

    /// Attach the vetted identity. Consumes the context so an identity,
    /// once set, is never swapped out from under a running request.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Correlation ID for logs and upstream calls.
    #[must_use]
    pub const fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Identity, if the request has been authenticated.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Identity of an authenticated request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] when no identity is attached.
    pub fn require_identity(&self) -> Result<&Identity, AuthError> {
        self.identity.as_ref().ok_or(AuthError::Unauthenticated)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Details;

    #[test]
    fn test_anonymous_context() {
        let ctx = RequestContext::new();
        assert!(ctx.identity().is_none());
        assert!(matches!(ctx.require_identity(), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn test_identity_attached() {
        let correlation_id = Uuid::new_v4();
        let ctx = RequestContext::with_correlation_id(correlation_id)
            .with_identity(Identity::session("u1", "t"));

        assert_eq!(ctx.correlation_id(), correlation_id);
        assert_eq!(ctx.require_identity().unwrap().user_id(), "u1");
    }
}
