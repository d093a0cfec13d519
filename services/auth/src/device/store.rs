//! Persistence seam for device authorizations.

use crate::device::model::{DeviceAuthorization, Pagination, StatusTransition};
use crate::error::AuthError;
use async_trait::async_trait;

/// Storage for device authorization records.
///
/// Implementations return records exactly as stored. Expiration only
/// matters to [`update`](Self::update), which must refuse expired records.
#[async_trait]
pub trait DeviceAuthorizationStore: Send + Sync {
    /// Persist a new record.
    async fn create(&self, authorization: DeviceAuthorization) -> Result<DeviceAuthorization, AuthError>;

    /// Look up a record by ID.
    async fn get_by_id(&self, id: &str) -> Result<Option<DeviceAuthorization>, AuthError>;

    /// Look up a record by its device token.
    async fn get_by_token(&self, token: &str) -> Result<Option<DeviceAuthorization>, AuthError>;

    /// Records owned by `user_id`, newest first.
    async fn list_by_user(
        &self,
        user_id: &str,
        pagination: Pagination,
    ) -> Result<Vec<DeviceAuthorization>, AuthError>;

    /// Apply `transition` only if the record is still pending and has not
    /// expired at `transition.modified_time`. The check and the write must
    /// be atomic: of two concurrent calls at most one succeeds. Returns
    /// `None` when the record is unknown, finalized, or expired.
    async fn update(
        &self,
        id: &str,
        transition: StatusTransition,
    ) -> Result<Option<DeviceAuthorization>, AuthError>;
}
