//! The vault service: encrypt-on-write, fail-closed-on-read.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use staffsight_core::{Clock, TenantId, UserId};

use crate::cache::SecretCache;
use crate::cipher::{CipherError, SecretCipher};
use crate::secret::{mask_secret, MaskedSecret, SecretRecord};
use crate::store::{SecretStore, SecretStoreError};

/// Errors surfaced from the *write* path. The read path never errors; absence
/// and failure both mean "not configured".
#[derive(Debug, Error)]
pub enum VaultError {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Store(#[from] SecretStoreError),
}

pub struct SecretsVault {
    store: Arc<dyn SecretStore>,
    cipher: SecretCipher,
    cache: SecretCache,
    clock: Arc<dyn Clock>,
}

impl SecretsVault {
    pub fn new(store: Arc<dyn SecretStore>, cipher: SecretCipher, clock: Arc<dyn Clock>) -> Self {
        let cache = SecretCache::new(clock.clone());
        Self {
            store,
            cipher,
            cache,
            clock,
        }
    }

    /// Encrypt and upsert one credential, then synchronously drop any cached
    /// plaintext for it.
    pub fn put(
        &self,
        tenant_id: TenantId,
        service: &str,
        key: &str,
        plaintext: &str,
        sensitive: bool,
        updated_by: UserId,
    ) -> Result<(), VaultError> {
        let value = self.cipher.encrypt(plaintext)?;
        self.store.upsert(SecretRecord {
            tenant_id,
            service: service.to_string(),
            key: key.to_string(),
            value,
            sensitive,
            updated_by,
            updated_at: self.clock.now(),
        })?;
        self.cache.remove(tenant_id, service, key);
        Ok(())
    }

    /// Look up and decrypt one credential.
    ///
    /// Absence, storage failure and cryptographic failure all come back as
    /// `None`: callers treat the feature as not configured. Failures are
    /// logged for operators.
    pub fn get(&self, tenant_id: TenantId, service: &str, key: &str) -> Option<String> {
        let record = match self.store.get(tenant_id, service, key) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => {
                warn!(%tenant_id, service, key, error = %err, "secret lookup failed");
                return None;
            }
        };

        match self.cipher.decrypt(&record.value) {
            Ok(plaintext) => Some(plaintext),
            Err(err) => {
                warn!(%tenant_id, service, key, error = %err, "secret decryption failed; treating as unconfigured");
                None
            }
        }
    }

    /// Read-through cached variant of [`get`](Self::get) (5-minute TTL).
    ///
    /// A failed underlying lookup evicts any stale cache entry so a deleted
    /// or corrupted secret cannot outlive its row.
    pub fn get_cached(&self, tenant_id: TenantId, service: &str, key: &str) -> Option<String> {
        if let Some(plaintext) = self.cache.get(tenant_id, service, key) {
            return Some(plaintext);
        }

        match self.get(tenant_id, service, key) {
            Some(plaintext) => {
                self.cache
                    .insert(tenant_id, service, key, plaintext.clone());
                Some(plaintext)
            }
            None => {
                self.cache.remove(tenant_id, service, key);
                None
            }
        }
    }

    /// Drop one cached entry, or all cached entries for a service.
    pub fn invalidate(&self, tenant_id: TenantId, service: &str, key: Option<&str>) {
        match key {
            Some(key) => self.cache.remove(tenant_id, service, key),
            None => self.cache.remove_service(tenant_id, service),
        }
    }

    /// Admin listing: keys plus masked values, never plaintext. A value that
    /// fails to decrypt masks entirely.
    pub fn list_masked(
        &self,
        tenant_id: TenantId,
        service: &str,
    ) -> Result<Vec<MaskedSecret>, VaultError> {
        let records = self.store.list_for_service(tenant_id, service)?;
        Ok(records
            .into_iter()
            .map(|record| {
                let masked_value = if record.sensitive {
                    "••••".to_string()
                } else {
                    match self.cipher.decrypt(&record.value) {
                        Ok(plaintext) => mask_secret(&plaintext),
                        Err(_) => "••••".to_string(),
                    }
                };
                MaskedSecret {
                    key: record.key,
                    masked_value,
                    sensitive: record.sensitive,
                    updated_at: record.updated_at,
                }
            })
            .collect())
    }

    /// True when a usable (decryptable, non-empty) value exists for the key.
    pub fn is_configured(&self, tenant_id: TenantId, service: &str, key: &str) -> bool {
        self.get(tenant_id, service, key)
            .is_some_and(|v| !v.trim().is_empty())
    }
}
