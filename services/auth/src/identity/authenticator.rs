//! Resolves the credential headers of an inbound request into an identity.

use crate::error::AuthError;
use crate::headers;
use crate::identity::{Identity, RequestContext};
use crate::session::SessionTokenValidator;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, instrument, warn};

/// Checks, in order, the service secret header and the session token header.
pub struct Authenticator {
    service_secret: Option<SecretString>,
    sessions: Arc<dyn SessionTokenValidator>,
}

impl Authenticator {
    /// Create an authenticator. Without a `service_secret`, the service
    /// secret header is never accepted.
    #[must_use]
    pub fn new(service_secret: Option<SecretString>, sessions: Arc<dyn SessionTokenValidator>) -> Self {
        Self {
            service_secret,
            sessions,
        }
    }

    /// Resolve the caller of a request and attach it to the context.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if no credential header is present
    ///   or the service secret does not match.
    /// - Any error of [`SessionTokenValidator::validate_session_token`].
    #[instrument(skip_all, fields(correlation_id = %ctx.correlation_id()))]
    pub async fn authenticate(
        &self,
        ctx: RequestContext,
        request_headers: &HeaderMap,
    ) -> Result<RequestContext, AuthError> {
        if let Some(presented) = header_value(request_headers, headers::SERVICE_SECRET) {
            return if self.service_secret_matches(presented) {
                debug!("Authenticated with service secret");
                Ok(ctx.with_identity(Identity::service_secret()))
            } else {
                warn!("Service secret mismatch");
                Err(AuthError::Unauthenticated)
            };
        }

        if let Some(token) = header_value(request_headers, headers::SESSION_TOKEN) {
            let identity = self.sessions.validate_session_token(&ctx, token).await?;
            return Ok(ctx.with_identity(identity));
        }

        Err(AuthError::Unauthenticated)
    }

    fn service_secret_matches(&self, presented: &str) -> bool {
        self.service_secret.as_ref().is_some_and(|expected| {
            bool::from(expected.expose_secret().as_bytes().ct_eq(presented.as_bytes()))
        })
    }
}

fn header_value<'a>(request_headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    request_headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AuthMethod, Details};
    use async_trait::async_trait;
    use reqwest::header::{HeaderName, HeaderValue};

    struct KnownSessions;

    #[async_trait]
    impl SessionTokenValidator for KnownSessions {
        async fn validate_session_token(
            &self,
            _ctx: &RequestContext,
            token: &str,
        ) -> Result<Identity, AuthError> {
            match token {
                "user-session" => Ok(Identity::session("u1", token)),
                _ => Err(AuthError::Unauthorized),
            }
        }
    }

    fn authenticator(secret: Option<&str>) -> Authenticator {
        Authenticator::new(
            secret.map(|s| SecretString::from(s.to_string())),
            Arc::new(KnownSessions),
        )
    }

    fn with_header(name: &'static str, value: &'static str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_static(value),
        );
        map
    }

    #[tokio::test]
    async fn test_service_secret_accepted() {
        let ctx = authenticator(Some("s3cret"))
            .authenticate(RequestContext::new(), &with_header(headers::SERVICE_SECRET, "s3cret"))
            .await
            .unwrap();
        let identity = ctx.require_identity().unwrap();
        assert_eq!(identity.method(), AuthMethod::ServiceSecret);
        assert!(identity.is_service());
    }

    #[tokio::test]
    async fn test_service_secret_mismatch() {
        let result = authenticator(Some("s3cret"))
            .authenticate(RequestContext::new(), &with_header(headers::SERVICE_SECRET, "guess"))
            .await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_service_secret_not_configured() {
        let result = authenticator(None)
            .authenticate(RequestContext::new(), &with_header(headers::SERVICE_SECRET, "s3cret"))
            .await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_session_token_delegated() {
        let ctx = authenticator(None)
            .authenticate(RequestContext::new(), &with_header(headers::SESSION_TOKEN, "user-session"))
            .await
            .unwrap();
        assert_eq!(ctx.require_identity().unwrap().user_id(), "u1");

        let result = authenticator(None)
            .authenticate(RequestContext::new(), &with_header(headers::SESSION_TOKEN, "stale"))
            .await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let result = authenticator(Some("s3cret"))
            .authenticate(RequestContext::new(), &HeaderMap::new())
            .await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }
}
