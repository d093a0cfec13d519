//! Session token validation against the Auth service.

use crate::error::AuthError;
use crate::headers;
use crate::identity::{Identity, RequestContext};
use crate::metrics;
use crate::server_token::ServerToken;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

/// Turns an inbound session token into a trusted identity.
#[async_trait]
pub trait SessionTokenValidator: Send + Sync {
    /// Validate `token` and return the identity it belongs to.
    async fn validate_session_token(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> Result<Identity, AuthError>;
}

/// Body of `GET /auth/token/{token}`.
///
/// Keys match case-insensitively and a repeated key overrides the earlier
/// value, so `isServer` and `isserver` may both appear.
#[derive(Debug, Default)]
struct TokenDetails {
    is_server: bool,
    userid: Option<String>,
}

impl<'de> Deserialize<'de> for TokenDetails {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DetailsVisitor;

        impl<'de> Visitor<'de> for DetailsVisitor {
            type Value = TokenDetails;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("token details object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TokenDetails, A::Error> {
                let mut details = TokenDetails::default();
                while let Some(key) = map.next_key::<String>()? {
                    if key.eq_ignore_ascii_case("isserver") {
                        details.is_server = map.next_value::<Option<bool>>()?.unwrap_or_default();
                    } else if key.eq_ignore_ascii_case("userid") {
                        details.userid = map.next_value()?;
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(details)
            }
        }

        deserializer.deserialize_map(DetailsVisitor)
    }
}

/// Validates session tokens by asking the Auth service, authenticated with
/// this service's own server token.
pub struct TokenValidator {
    server_token: Arc<dyn ServerToken>,
    http: Client,
    auth_url: Url,
}

impl TokenValidator {
    /// Create a validator for the Auth service at `auth_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidArgument`] if `auth_url` cannot carry a
    /// path.
    pub fn new(
        server_token: Arc<dyn ServerToken>,
        http: Client,
        auth_url: Url,
    ) -> Result<Self, AuthError> {
        if auth_url.cannot_be_a_base() {
            return Err(AuthError::invalid_argument(format!("invalid auth url: {auth_url}")));
        }
        Ok(Self {
            server_token,
            http,
            auth_url,
        })
    }

    fn token_url(&self, token: &str) -> Url {
        let mut url = self.auth_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["auth", "token", token]);
        }
        url
    }

    fn upstream_unavailable(&self, status: Option<StatusCode>) -> AuthError {
        AuthError::UpstreamUnavailable {
            method: Method::GET.to_string(),
            url: self.token_url("***").to_string(),
            status: status.map(|s| s.as_u16()),
        }
    }
}

#[async_trait]
impl SessionTokenValidator for TokenValidator {
    #[instrument(skip_all, fields(correlation_id = %ctx.correlation_id()))]
    async fn validate_session_token(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::invalid_argument("session token is missing"));
        }

        let server_token = self.server_token.server_token()?;

        let response = self
            .http
            .get(self.token_url(token))
            .header(headers::SESSION_TOKEN, server_token)
            .header(headers::CORRELATION_ID, ctx.correlation_id().to_string())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Session validation request failed");
                metrics::record_session_validation("upstream_error");
                self.upstream_unavailable(e.status())
            })?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => {
                metrics::record_session_validation("unauthorized");
                return Err(AuthError::Unauthorized);
            }
            status => {
                warn!(%status, "Auth service rejected session validation");
                metrics::record_session_validation("upstream_error");
                return Err(self.upstream_unavailable(Some(status)));
            }
        }

        let details: TokenDetails = response.json().await.map_err(|e| {
            metrics::record_session_validation("malformed");
            AuthError::malformed(format!("invalid token details: {e}"))
        })?;

        if details.is_server {
            metrics::record_session_validation("server");
            debug!("Validated server session token");
            return Ok(Identity::session("", token));
        }

        match details.userid.filter(|id| !id.is_empty()) {
            Some(user_id) => {
                metrics::record_session_validation("user");
                debug!(user_id = %user_id, "Validated user session token");
                Ok(Identity::session(user_id, token))
            }
            None => {
                metrics::record_session_validation("malformed");
                Err(AuthError::malformed("user id is missing"))
            }
        }
    }
}
