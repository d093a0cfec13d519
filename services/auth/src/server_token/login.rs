//! Server login exchange with the Auth service.

use crate::headers;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_common::PlatformError;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};
use url::Url;

/// One credential refresh exchange.
#[async_trait]
pub trait ServerLogin: Send + Sync {
    /// Obtain a fresh server session token.
    async fn login(&self) -> Result<String, PlatformError>;
}

/// `POST {auth}/serverlogin` over HTTP.
pub struct HttpServerLogin {
    http: Client,
    url: Url,
    server_name: String,
    server_secret: SecretString,
}

impl HttpServerLogin {
    /// Create the exchange against the Auth service at `auth_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidInput`] if `auth_url` cannot carry a
    /// path or the server name is empty.
    pub fn new(
        http: Client,
        auth_url: &Url,
        server_name: impl Into<String>,
        server_secret: SecretString,
    ) -> Result<Self, PlatformError> {
        let server_name = server_name.into();
        if server_name.is_empty() {
            return Err(PlatformError::invalid_input("server name is empty"));
        }

        let mut url = auth_url.clone();
        url.path_segments_mut()
            .map_err(|()| PlatformError::invalid_input(format!("invalid auth url: {auth_url}")))?
            .pop_if_empty()
            .push("serverlogin");

        Ok(Self {
            http,
            url,
            server_name,
            server_secret,
        })
    }

    /// Login endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ServerLogin for HttpServerLogin {
    #[instrument(skip(self), fields(server = %self.server_name))]
    async fn login(&self) -> Result<String, PlatformError> {
        let response = self
            .http
            .post(self.url.clone())
            .header(headers::SERVER_NAME, &self.server_name)
            .header(headers::SERVER_SECRET, self.server_secret.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PlatformError::unavailable(format!(
                "POST {} returned {status}",
                self.url
            )));
        }

        let token = response
            .headers()
            .get(headers::SESSION_TOKEN)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                PlatformError::unavailable(format!(
                    "POST {} returned no {} header",
                    self.url,
                    headers::SESSION_TOKEN
                ))
            })?;

        debug!("Server login succeeded");
        Ok(token.to_string())
    }
}
