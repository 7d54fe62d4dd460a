//! Secret storage abstraction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use staffsight_core::TenantId;

use crate::secret::SecretRecord;

/// Secret store abstraction.
///
/// Uniqueness by `(tenant, service, key)` is the store's responsibility:
/// `upsert` replaces any existing row for the same triple.
pub trait SecretStore: Send + Sync {
    fn upsert(&self, record: SecretRecord) -> Result<(), SecretStoreError>;

    fn get(
        &self,
        tenant_id: TenantId,
        service: &str,
        key: &str,
    ) -> Result<Option<SecretRecord>, SecretStoreError>;

    fn list_for_service(
        &self,
        tenant_id: TenantId,
        service: &str,
    ) -> Result<Vec<SecretRecord>, SecretStoreError>;

    fn delete(
        &self,
        tenant_id: TenantId,
        service: &str,
        key: &str,
    ) -> Result<bool, SecretStoreError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SecretStoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

type SecretKey = (TenantId, String, String);

/// In-memory secret store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    records: RwLock<HashMap<SecretKey, SecretRecord>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl SecretStore for InMemorySecretStore {
    fn upsert(&self, record: SecretRecord) -> Result<(), SecretStoreError> {
        let key = (
            record.tenant_id,
            record.service.clone(),
            record.key.clone(),
        );
        self.records.write().unwrap().insert(key, record);
        Ok(())
    }

    fn get(
        &self,
        tenant_id: TenantId,
        service: &str,
        key: &str,
    ) -> Result<Option<SecretRecord>, SecretStoreError> {
        let records = self.records.read().unwrap();
        Ok(records
            .get(&(tenant_id, service.to_string(), key.to_string()))
            .cloned())
    }

    fn list_for_service(
        &self,
        tenant_id: TenantId,
        service: &str,
    ) -> Result<Vec<SecretRecord>, SecretStoreError> {
        let records = self.records.read().unwrap();
        let mut result: Vec<_> = records
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.service == service)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(result)
    }

    fn delete(
        &self,
        tenant_id: TenantId,
        service: &str,
        key: &str,
    ) -> Result<bool, SecretStoreError> {
        let mut records = self.records.write().unwrap();
        Ok(records
            .remove(&(tenant_id, service.to_string(), key.to_string()))
            .is_some())
    }
}
