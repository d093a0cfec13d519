//! Device authorization lifecycle.
//!
//! A record starts `Pending`, carrying a bearer token for the device and a
//! short verification code shown to the user. It leaves `Pending` exactly
//! once: confirmed with the matching code, or declined by its owner. A
//! pending record past its expiration time behaves as if it had failed.

use crate::clock::Clock;
use crate::device::generator::DeviceAuthorizationGenerator;
use crate::device::model::{
    DeviceAuthorization, DeviceAuthorizationStatus, DeviceAuthorizationUpdate, Pagination,
    StatusTransition,
};
use crate::device::store::DeviceAuthorizationStore;
use crate::error::AuthError;
use crate::identity::Details;
use crate::metrics;
use chrono::TimeDelta;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};

/// Default lifetime of a pending authorization, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 30 * 60;

/// Longest device push token accepted.
pub const MAX_PUSH_TOKEN_LENGTH: usize = 1024;

/// Operations on device authorizations over a store and a clock.
pub struct DeviceAuthorizationWorkflow {
    store: Arc<dyn DeviceAuthorizationStore>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
}

impl DeviceAuthorizationWorkflow {
    /// Workflow with the default 30 minute record lifetime.
    #[must_use]
    pub fn new(store: Arc<dyn DeviceAuthorizationStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: TimeDelta::seconds(DEFAULT_TTL_SECS),
        }
    }

    /// Override the lifetime of new records.
    #[must_use]
    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    /// Open a pending authorization for `user_id`.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidArgument`] for an empty user ID or an empty or
    /// oversized push token, or any store error.
    #[instrument(skip(self, device_push_token))]
    pub async fn create(
        &self,
        user_id: &str,
        device_push_token: &str,
    ) -> Result<DeviceAuthorization, AuthError> {
        require_user_id(user_id)?;
        if device_push_token.is_empty() {
            return Err(AuthError::invalid_argument("device push token is missing"));
        }
        if device_push_token.len() > MAX_PUSH_TOKEN_LENGTH {
            return Err(AuthError::invalid_argument(format!(
                "device push token exceeds {MAX_PUSH_TOKEN_LENGTH} characters"
            )));
        }

        let now = self.clock.now();
        let authorization = DeviceAuthorization {
            id: DeviceAuthorizationGenerator::generate_id(),
            user_id: user_id.to_string(),
            token: DeviceAuthorizationGenerator::generate_token(),
            device_push_token: device_push_token.to_string(),
            status: DeviceAuthorizationStatus::Pending,
            bundle_id: None,
            verification_code: DeviceAuthorizationGenerator::generate_verification_code(),
            device_check_token: None,
            created_time: now,
            expiration_time: now + self.ttl,
            modified_time: now,
        };

        let created = self.store.create(authorization).await?;
        metrics::record_device_event("created");
        info!(id = %created.id, expires_at = %created.expiration_time, "Device authorization created");
        Ok(created)
    }

    /// Look up a pending authorization by the token handed to the device.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] when the token is unknown, the record is
    /// finalized, or it has expired. The three cases are indistinguishable.
    #[instrument(skip_all)]
    pub async fn get_by_token(&self, token: &str) -> Result<DeviceAuthorization, AuthError> {
        if token.is_empty() {
            return Err(AuthError::NotFound);
        }

        let now = self.clock.now();
        match self.store.get_by_token(token).await? {
            Some(record) if record.is_actionable(now) => Ok(record),
            _ => Err(AuthError::NotFound),
        }
    }

    /// Records owned by `user_id`, newest first, with their effective status.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] when `identity` is not `user_id`.
    #[instrument(skip(self, identity))]
    pub async fn list_for_user(
        &self,
        identity: &dyn Details,
        user_id: &str,
        pagination: Pagination,
    ) -> Result<Vec<DeviceAuthorization>, AuthError> {
        require_owner(identity, user_id)?;

        let now = self.clock.now();
        let records = self.store.list_by_user(user_id, pagination).await?;
        Ok(records
            .into_iter()
            .map(|record| record.with_effective_status(now))
            .collect())
    }

    /// A single record owned by `user_id`, with its effective status.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] when `identity` is not `user_id`;
    /// [`AuthError::NotFound`] when the record is unknown or owned by
    /// another user.
    #[instrument(skip(self, identity))]
    pub async fn get_for_user(
        &self,
        identity: &dyn Details,
        user_id: &str,
        id: &str,
    ) -> Result<DeviceAuthorization, AuthError> {
        require_owner(identity, user_id)?;
        let record = self.owned_record(user_id, id).await?;
        Ok(record.with_effective_status(self.clock.now()))
    }

    /// Confirm a pending authorization with its verification code.
    ///
    /// A wrong code leaves the record pending, so the user may retry until
    /// it expires.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidArgument`] for an empty bundle ID or code.
    /// - [`AuthError::NotFound`] when the record is unknown, finalized,
    ///   expired, or was finalized concurrently.
    /// - [`AuthError::VerificationMismatch`] when the code does not match.
    #[instrument(skip(self, update), fields(bundle_id = %update.bundle_id))]
    pub async fn update(
        &self,
        id: &str,
        update: DeviceAuthorizationUpdate,
    ) -> Result<DeviceAuthorization, AuthError> {
        if update.bundle_id.is_empty() {
            return Err(AuthError::invalid_argument("bundle id is missing"));
        }
        if update.verification_code.is_empty() {
            return Err(AuthError::invalid_argument("verification code is missing"));
        }

        let record = match self.store.get_by_id(id).await? {
            Some(record) if record.is_actionable(self.clock.now()) => record,
            _ => return Err(AuthError::NotFound),
        };

        let matches: bool = record
            .verification_code
            .as_bytes()
            .ct_eq(update.verification_code.as_bytes())
            .into();
        if !matches {
            metrics::record_device_event("mismatch");
            warn!("Verification code mismatch");
            return Err(AuthError::VerificationMismatch);
        }

        let confirmed = self
            .finalize(id, StatusTransition::confirm(update, self.clock.now()))
            .await?;
        metrics::record_device_event("confirmed");
        info!("Device authorization confirmed");
        Ok(confirmed)
    }

    /// Decline a pending authorization on behalf of its owner.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] when `identity` is not `user_id`;
    /// [`AuthError::NotFound`] when the record is unknown, owned by another
    /// user, finalized, or expired.
    #[instrument(skip(self, identity))]
    pub async fn reject(
        &self,
        identity: &dyn Details,
        user_id: &str,
        id: &str,
    ) -> Result<DeviceAuthorization, AuthError> {
        require_owner(identity, user_id)?;

        let record = self.owned_record(user_id, id).await?;
        if !record.is_actionable(self.clock.now()) {
            return Err(AuthError::NotFound);
        }

        let rejected = self
            .finalize(id, StatusTransition::reject(self.clock.now()))
            .await?;
        metrics::record_device_event("rejected");
        info!("Device authorization rejected");
        Ok(rejected)
    }

    async fn owned_record(&self, user_id: &str, id: &str) -> Result<DeviceAuthorization, AuthError> {
        match self.store.get_by_id(id).await? {
            Some(record) if record.user_id == user_id => Ok(record),
            _ => Err(AuthError::NotFound),
        }
    }

    /// Commit a terminal transition. The store re-checks expiry at the
    /// transition's time under its own lock.
    async fn finalize(
        &self,
        id: &str,
        transition: StatusTransition,
    ) -> Result<DeviceAuthorization, AuthError> {
        self.store
            .update(id, transition)
            .await?
            .ok_or_else(|| {
                debug!("Lost conditional transition");
                AuthError::NotFound
            })
    }
}

fn require_user_id(user_id: &str) -> Result<(), AuthError> {
    if user_id.is_empty() {
        return Err(AuthError::invalid_argument("user id is missing"));
    }
    Ok(())
}

fn require_owner(identity: &dyn Details, user_id: &str) -> Result<(), AuthError> {
    require_user_id(user_id)?;
    if identity.user_id() != user_id {
        return Err(AuthError::Unauthorized);
    }
    Ok(())
}
