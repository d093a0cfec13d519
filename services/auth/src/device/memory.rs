//! In-process device authorization store.

use crate::device::model::{DeviceAuthorization, Pagination, StatusTransition};
use crate::device::store::DeviceAuthorizationStore;
use crate::error::AuthError;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<String, DeviceAuthorization>,
    id_by_token: HashMap<String, String>,
}

/// Store backed by a map, for tests and single-instance deployments.
///
/// The pending and expiry checks of
/// [`update`](DeviceAuthorizationStore::update) happen under the same write
/// lock as the write.
#[derive(Debug, Default)]
pub struct MemoryDeviceAuthorizationStore {
    records: RwLock<Records>,
}

impl MemoryDeviceAuthorizationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceAuthorizationStore for MemoryDeviceAuthorizationStore {
    async fn create(&self, authorization: DeviceAuthorization) -> Result<DeviceAuthorization, AuthError> {
        let mut records = self.records.write().await;
        if records.by_id.contains_key(&authorization.id)
            || records.id_by_token.contains_key(&authorization.token)
        {
            return Err(AuthError::store("duplicate device authorization"));
        }

        records
            .id_by_token
            .insert(authorization.token.clone(), authorization.id.clone());
        records
            .by_id
            .insert(authorization.id.clone(), authorization.clone());
        Ok(authorization)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<DeviceAuthorization>, AuthError> {
        Ok(self.records.read().await.by_id.get(id).cloned())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<DeviceAuthorization>, AuthError> {
        let records = self.records.read().await;
        Ok(records
            .id_by_token
            .get(token)
            .and_then(|id| records.by_id.get(id))
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        pagination: Pagination,
    ) -> Result<Vec<DeviceAuthorization>, AuthError> {
        let records = self.records.read().await;
        let mut owned: Vec<&DeviceAuthorization> = records
            .by_id
            .values()
            .filter(|record| record.user_id == user_id)
            .collect();
        owned.sort_by_key(|record| (Reverse(record.created_time), record.id.clone()));

        Ok(owned
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.size)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: &str,
        transition: StatusTransition,
    ) -> Result<Option<DeviceAuthorization>, AuthError> {
        let mut records = self.records.write().await;
        match records.by_id.get_mut(id) {
            Some(record) if record.is_actionable(transition.modified_time) => {
                transition.apply(record);
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }
}
