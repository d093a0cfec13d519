//! Wiring of the auth components from configuration.

use crate::clock::SystemClock;
use crate::config::Config;
use crate::device::{DeviceAuthorizationStore, DeviceAuthorizationWorkflow};
use crate::error::AuthError;
use crate::identity::Authenticator;
use crate::server_token::{HttpServerLogin, ServerToken, ServerTokenManager};
use crate::session::{SessionTokenValidator, TokenValidator};
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Components of the auth subsystem sharing one server credential.
pub struct AuthService {
    /// Manager of this service's outbound credential
    pub server_token: Arc<ServerTokenManager>,
    /// Validator for inbound session tokens
    pub sessions: Arc<TokenValidator>,
    /// Resolver for inbound credential headers
    pub authenticator: Authenticator,
    /// Device authorization workflow
    pub devices: DeviceAuthorizationWorkflow,
}

impl AuthService {
    /// Build the components. Nothing runs until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns an error if the configured Auth service URL or server name
    /// is unusable.
    pub fn new(
        config: &Config,
        http: Client,
        store: Arc<dyn DeviceAuthorizationStore>,
    ) -> Result<Self, AuthError> {
        let login = HttpServerLogin::new(
            http.clone(),
            &config.auth_service_url,
            &config.server_name,
            config.server_secret.clone(),
        )?;
        let server_token = Arc::new(ServerTokenManager::new(
            Arc::new(login),
            config.backoff_config(),
        ));

        let sessions = Arc::new(TokenValidator::new(
            Arc::clone(&server_token) as Arc<dyn ServerToken>,
            http,
            config.auth_service_url.clone(),
        )?);
        let authenticator = Authenticator::new(
            config.service_secret.clone(),
            Arc::clone(&sessions) as Arc<dyn SessionTokenValidator>,
        );

        let devices = DeviceAuthorizationWorkflow::new(store, Arc::new(SystemClock))
            .with_ttl(config.device_authorization_ttl());

        Ok(Self {
            server_token,
            sessions,
            authenticator,
            devices,
        })
    }

    /// Begin refreshing the server credential.
    pub fn start(&self) {
        self.server_token.start();
        info!("Auth service started");
    }

    /// Stop refreshing the server credential and wait for the worker.
    pub async fn close(&self) {
        self.server_token.close().await;
        info!("Auth service closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemoryDeviceAuthorizationStore;

    fn config() -> Config {
        Config::from_lookup(|name| match name {
            "SERVER_SECRET" => Some("s3cret".to_string()),
            "AUTH_SERVICE_URL" => Some("http://127.0.0.1:9/".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_not_started_has_no_credential() {
        let service = AuthService::new(
            &config(),
            Client::new(),
            Arc::new(MemoryDeviceAuthorizationStore::new()),
        )
        .unwrap();

        assert!(matches!(
            service.server_token.current_token(),
            Err(AuthError::NotStarted)
        ));
        service.close().await;
    }

    #[tokio::test]
    async fn test_devices_use_configured_ttl() {
        let service = AuthService::new(
            &config(),
            Client::new(),
            Arc::new(MemoryDeviceAuthorizationStore::new()),
        )
        .unwrap();

        let record = service.devices.create("u1", "ptok").await.unwrap();
        assert_eq!(
            record.expiration_time - record.created_time,
            chrono::TimeDelta::minutes(30)
        );
    }
}
