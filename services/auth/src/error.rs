//! Error handling for the auth subsystem.
//!
//! One non-exhaustive enum covers every failure a caller can observe. Each
//! variant maps to a stable [`ErrorCode`] and an HTTP status so the routing
//! layer can translate errors without inspecting messages. Responses built
//! with [`ErrorResponse`] never carry tokens, secrets or upstream URLs.

use reqwest::StatusCode;
use rust_common::PlatformError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Non-exhaustive error enum for forward compatibility.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    /// Caller supplied an empty or malformed argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No usable credential was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// The credential does not grant access to the resource
    #[error("Unauthorized")]
    Unauthorized,

    /// Unknown, expired or already finalized resource
    #[error("Not found")]
    NotFound,

    /// Verification code does not match a live pending authorization
    #[error("Verification code mismatch")]
    VerificationMismatch,

    /// The Auth service could not be reached or answered unexpectedly
    #[error("Upstream unavailable: {method} {url} (status {})", display_status(.status))]
    UpstreamUnavailable {
        /// HTTP method of the failed request
        method: String,
        /// Request URL with credentials redacted
        url: String,
        /// Response status, absent for transport failures
        status: Option<u16>,
    },

    /// The Auth service answered 200 with an unusable body
    #[error("Malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    /// The server token manager is not running
    #[error("Server token manager not started")]
    NotStarted,

    /// No server token refresh has succeeded yet
    #[error("Server token not yet available")]
    NoCredentialYet,

    /// Device authorization store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Shared platform failure (HTTP client construction and similar)
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl AuthError {
    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a malformed upstream response error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedUpstreamResponse(msg.into())
    }

    /// Create a store error.
    #[must_use]
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Unauthenticated => ErrorCode::Unauthenticated,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::NotFound => ErrorCode::NotFound,
            Self::VerificationMismatch => ErrorCode::VerificationMismatch,
            Self::UpstreamUnavailable { .. } => ErrorCode::UpstreamUnavailable,
            Self::MalformedUpstreamResponse(_) => ErrorCode::MalformedUpstreamResponse,
            Self::NotStarted => ErrorCode::NotStarted,
            Self::NoCredentialYet => ErrorCode::NoCredentialYet,
            Self::Store(_) | Self::Platform(_) => ErrorCode::Internal,
        }
    }

    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamUnavailable { .. } | Self::NoCredentialYet | Self::Store(_) => true,
            Self::Platform(err) => err.is_retryable(),
            _ => false,
        }
    }
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

/// Stable error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    /// Request field missing or malformed
    InvalidArgument,
    /// No usable credential presented
    Unauthenticated,
    /// Caller may not act on the resource
    Unauthorized,
    /// Resource unknown or no longer actionable
    NotFound,
    /// Verification code did not match
    VerificationMismatch,
    /// Auth service unreachable or refused
    UpstreamUnavailable,
    /// Auth service answered with an unreadable body
    MalformedUpstreamResponse,
    /// Server token manager not running
    NotStarted,
    /// No server token obtained yet
    NoCredentialYet,
    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Unauthenticated => "AUTH_UNAUTHENTICATED",
            Self::Unauthorized => "AUTH_UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::VerificationMismatch => "DEVICE_VERIFICATION_MISMATCH",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::MalformedUpstreamResponse => "UPSTREAM_MALFORMED_RESPONSE",
            Self::NotStarted => "SERVER_TOKEN_NOT_STARTED",
            Self::NoCredentialYet => "SERVER_TOKEN_UNAVAILABLE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// HTTP status used at the service boundary.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument | Self::VerificationMismatch => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable | Self::MalformedUpstreamResponse => StatusCode::BAD_GATEWAY,
            Self::NotStarted | Self::NoCredentialYet => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Sanitized error body with correlation ID.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
    /// Correlation ID for tracing
    pub correlation_id: Uuid,
}

impl ErrorResponse {
    /// Build a response from an [`AuthError`].
    #[must_use]
    pub fn from_error(error: &AuthError, correlation_id: Uuid) -> Self {
        let message = match error {
            AuthError::InvalidArgument(reason) => reason.clone(),
            AuthError::Unauthenticated => "Authentication required".to_string(),
            AuthError::Unauthorized => "Access denied".to_string(),
            AuthError::NotFound => "Not found".to_string(),
            AuthError::VerificationMismatch => "Verification code does not match".to_string(),
            AuthError::UpstreamUnavailable { .. } | AuthError::MalformedUpstreamResponse(_) => {
                "Auth service temporarily unavailable".to_string()
            }
            AuthError::NotStarted | AuthError::NoCredentialYet => {
                "Service credential temporarily unavailable".to_string()
            }
            // Never expose internal error details
            AuthError::Store(_) | AuthError::Platform(_) => "Internal error".to_string(),
        };

        Self {
            code: error.code().as_str(),
            message,
            correlation_id,
        }
    }

    /// HTTP status for this response.
    #[must_use]
    pub fn status(error: &AuthError) -> StatusCode {
        error.code().http_status()
    }
}
