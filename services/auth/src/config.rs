//! Service configuration loaded from the environment.

use rust_common::{BackoffConfig, HttpConfig, TracingConfig};
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable holding the URL
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// A duration setting was zero
    #[error("Invalid {0}: must be greater than 0")]
    InvalidDuration(&'static str),

    /// First failure backoff above the cap
    #[error("Invalid backoff: first failure backoff exceeds the maximum")]
    InvalidBackoff,

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Name and version of the running build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
}

impl ServiceInfo {
    /// Info of this build.
    #[must_use]
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// `User-Agent` value for outbound requests.
    #[must_use]
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Build identity
    pub service: ServiceInfo,
    /// Base URL of the Auth service
    pub auth_service_url: Url,
    /// Name this server logs in as
    pub server_name: String,
    /// Secret this server logs in with
    pub server_secret: SecretString,
    /// Secret accepted from trusted callers, if any
    pub service_secret: Option<SecretString>,
    /// Server token lifetime in seconds (must be > 0)
    pub server_token_ttl_secs: u64,
    /// Delay after the first refresh failure, in milliseconds
    pub first_failure_backoff_ms: u64,
    /// Cap for refresh failure delays, in milliseconds
    pub max_failure_backoff_ms: u64,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Device authorization lifetime in seconds
    pub device_authorization_ttl_secs: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
    /// Log filter directive
    pub log_level: String,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for missing, unparsable or invalid settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for missing, unparsable or invalid settings.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service = ServiceInfo::current();
        let vars = Vars(lookup);

        let config = Self {
            auth_service_url: vars.url("AUTH_SERVICE_URL", "http://localhost:9222")?,
            server_name: vars.string("SERVER_NAME", &service.name),
            server_secret: vars
                .get("SERVER_SECRET")
                .map(SecretString::from)
                .ok_or_else(|| ConfigError::MissingRequired("SERVER_SECRET".to_string()))?,
            service_secret: vars.get("SERVICE_SECRET").map(SecretString::from),
            server_token_ttl_secs: vars.parse("SERVER_TOKEN_TTL", 3600)?,
            first_failure_backoff_ms: vars.parse("FIRST_FAILURE_BACKOFF_MS", 1000)?,
            max_failure_backoff_ms: vars.parse("MAX_FAILURE_BACKOFF_MS", 60_000)?,
            request_timeout_secs: vars.parse("REQUEST_TIMEOUT", 30)?,
            device_authorization_ttl_secs: vars.parse("DEVICE_AUTHORIZATION_TTL", 1800)?,
            shutdown_timeout_secs: vars.parse("SHUTDOWN_TIMEOUT", 30)?,
            log_level: vars.string("LOG_LEVEL", "info"),
            log_json: vars.parse("LOG_JSON", false)?,
            service,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth_service_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                field: "AUTH_SERVICE_URL".to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }
        if self.server_name.is_empty() {
            return Err(ConfigError::MissingRequired("SERVER_NAME".to_string()));
        }
        if self.server_secret.expose_secret().is_empty() {
            return Err(ConfigError::MissingRequired("SERVER_SECRET".to_string()));
        }

        for (name, value) in [
            ("SERVER_TOKEN_TTL", self.server_token_ttl_secs),
            ("FIRST_FAILURE_BACKOFF_MS", self.first_failure_backoff_ms),
            ("MAX_FAILURE_BACKOFF_MS", self.max_failure_backoff_ms),
            ("REQUEST_TIMEOUT", self.request_timeout_secs),
            ("DEVICE_AUTHORIZATION_TTL", self.device_authorization_ttl_secs),
            ("SHUTDOWN_TIMEOUT", self.shutdown_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidDuration(name));
            }
        }

        if self.first_failure_backoff_ms > self.max_failure_backoff_ms {
            return Err(ConfigError::InvalidBackoff);
        }
        if chrono::TimeDelta::from_std(Duration::from_secs(self.device_authorization_ttl_secs)).is_err() {
            return Err(ConfigError::ParseError {
                name: "DEVICE_AUTHORIZATION_TTL".to_string(),
                reason: "value out of range".to_string(),
            });
        }
        Ok(())
    }

    /// Refresh schedule for the server token manager.
    #[must_use]
    pub const fn backoff_config(&self) -> BackoffConfig {
        BackoffConfig::new(Duration::from_secs(self.server_token_ttl_secs))
            .with_first_failure(Duration::from_millis(self.first_failure_backoff_ms))
            .with_max_failure(Duration::from_millis(self.max_failure_backoff_ms))
    }

    /// Outbound HTTP client settings.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::default()
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_user_agent(self.service.user_agent())
    }

    /// Logging settings.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig::default()
            .with_service_name(&self.service.name)
            .with_log_level(&self.log_level)
            .with_json_output(self.log_json)
    }

    /// Lifetime of new device authorizations.
    #[must_use]
    pub fn device_authorization_ttl(&self) -> chrono::TimeDelta {
        // Range checked in `validate`.
        chrono::TimeDelta::from_std(Duration::from_secs(self.device_authorization_ttl_secs))
            .unwrap_or_else(|_| chrono::TimeDelta::seconds(crate::device::workflow::DEFAULT_TTL_SECS))
    }

    /// Time allowed for shutdown.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable with a default value.
    fn parse<T: std::str::FromStr>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
                name: name.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    /// Parse a URL variable with a default value.
    fn url(&self, name: &str, default: &str) -> Result<Url, ConfigError> {
        let url_str = self.string(name, default);
        Url::parse(&url_str).map_err(|e| ConfigError::InvalidUrl {
            field: name.to_string(),
            reason: e.to_string(),
        })
    }
}
