//! Header names shared by the platform services.

/// Name of the calling service, sent on server login.
pub const SERVER_NAME: &str = "X-Tidepool-Server-Name";

/// Shared secret of the calling service, sent on server login.
pub const SERVER_SECRET: &str = "X-Tidepool-Server-Secret";

/// Session token, both issued by server login and presented on requests.
pub const SESSION_TOKEN: &str = "X-Tidepool-Session-Token";

/// Shared service secret presented directly by trusted peers.
pub const SERVICE_SECRET: &str = "X-Tidepool-Service-Secret";

/// Correlation ID propagated to upstream calls.
pub const CORRELATION_ID: &str = "X-Correlation-Id";
