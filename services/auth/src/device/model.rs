//! Device authorization records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Lifecycle state of a device authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceAuthorizationStatus {
    /// Waiting for the owning user to confirm
    Pending,
    /// Confirmed with the matching verification code
    Successful,
    /// Declined, or expired while pending
    Failed,
}

impl DeviceAuthorizationStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Successful => "successful",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DeviceAuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pairing request from a push-notification-only device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAuthorization {
    /// Record identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Bearer token handed to the device
    pub token: String,
    /// Push token of the device
    pub device_push_token: String,
    /// Persisted status; see [`effective_status`](Self::effective_status)
    pub status: DeviceAuthorizationStatus,
    /// App bundle that confirmed the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    /// Code the user must enter on the device
    pub verification_code: String,
    /// Device attestation token supplied on confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_check_token: Option<String>,
    /// Creation time
    pub created_time: DateTime<Utc>,
    /// End of the pending window
    pub expiration_time: DateTime<Utc>,
    /// Time of the last status change
    pub modified_time: DateTime<Utc>,
}

impl DeviceAuthorization {
    /// Status as persisted.
    #[must_use]
    pub const fn status(&self) -> DeviceAuthorizationStatus {
        self.status
    }

    /// Whether the record has outlived its TTL.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration_time
    }

    /// Pending and not expired: the only state anything may act on.
    #[must_use]
    pub fn is_actionable(&self, now: DateTime<Utc>) -> bool {
        self.status == DeviceAuthorizationStatus::Pending && !self.is_expired_at(now)
    }

    /// Status as every reader must see it: an expired pending record is
    /// failed even though the store still says pending.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> DeviceAuthorizationStatus {
        if self.status == DeviceAuthorizationStatus::Pending && self.is_expired_at(now) {
            DeviceAuthorizationStatus::Failed
        } else {
            self.status
        }
    }

    /// Copy of the record carrying its effective status.
    #[must_use]
    pub fn with_effective_status(mut self, now: DateTime<Utc>) -> Self {
        self.status = self.effective_status(now);
        self
    }
}

/// Confirmation submitted for a pending authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAuthorizationUpdate {
    /// App bundle confirming the record
    pub bundle_id: String,
    /// Code entered by the user
    pub verification_code: String,
    /// Optional device attestation token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_check_token: Option<String>,
}

/// Changes a store applies when a pending record reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    /// Terminal status to set
    pub status: DeviceAuthorizationStatus,
    /// Bundle ID to record, if any
    pub bundle_id: Option<String>,
    /// Device check token to record, if any
    pub device_check_token: Option<String>,
    /// Time of the change; the record must not be expired at this instant
    pub modified_time: DateTime<Utc>,
}

impl StatusTransition {
    /// Transition to `Successful` for a confirmed update.
    #[must_use]
    pub fn confirm(update: DeviceAuthorizationUpdate, now: DateTime<Utc>) -> Self {
        Self {
            status: DeviceAuthorizationStatus::Successful,
            bundle_id: Some(update.bundle_id),
            device_check_token: update.device_check_token.filter(|t| !t.is_empty()),
            modified_time: now,
        }
    }

    /// Transition to `Failed`.
    #[must_use]
    pub fn reject(now: DateTime<Utc>) -> Self {
        Self {
            status: DeviceAuthorizationStatus::Failed,
            bundle_id: None,
            device_check_token: None,
            modified_time: now,
        }
    }

    /// Apply to a record.
    pub fn apply(&self, record: &mut DeviceAuthorization) {
        record.status = self.status;
        if let Some(bundle_id) = &self.bundle_id {
            record.bundle_id = Some(bundle_id.clone());
        }
        if let Some(device_check_token) = &self.device_check_token {
            record.device_check_token = Some(device_check_token.clone());
        }
        record.modified_time = self.modified_time;
    }
}

/// Page selection for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Zero-based page index
    pub page: usize,
    /// Records per page
    pub size: usize,
}

impl Pagination {
    /// Validated page selection.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when `size` is outside
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(page: usize, size: usize) -> Result<Self, String> {
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(format!("page size must be between 1 and {MAX_PAGE_SIZE}"));
        }
        Ok(Self { page, size })
    }

    /// Records to skip.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}
