//! AES-256-GCM encryption of secret values.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Environment variable holding the base64-encoded 32-byte master key.
pub const MASTER_KEY_ENV: &str = "STAFFSIGHT_VAULT_MASTER_KEY";

pub const MASTER_KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
/// GCM appends a 16-byte authentication tag to the ciphertext, so tag and
/// ciphertext round-trip through a single stored column.
pub const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CipherError {
    /// No master key configured. Fatal at process start for any code path
    /// that needs the vault.
    #[error("vault master key is not configured ({MASTER_KEY_ENV})")]
    MissingMasterKey,

    #[error("vault master key is malformed (expected base64 of {MASTER_KEY_LEN} bytes)")]
    InvalidMasterKey,

    /// Any cryptographic failure: corrupt ciphertext, tag mismatch, bad nonce.
    /// Callers must fail closed on this.
    #[error("vault cryptographic operation failed")]
    Crypto,
}

/// Encrypted value as stored at rest: base64 everywhere.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncryptedValue {
    pub nonce_b64: String,
    pub ciphertext_b64: String,
}

/// Process-wide symmetric cipher for vault entries.
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Build from the process environment. Missing or malformed key is a hard
    /// error; callers are expected to abort startup on it.
    pub fn from_env() -> Result<Self, CipherError> {
        let encoded = std::env::var(MASTER_KEY_ENV).map_err(|_| CipherError::MissingMasterKey)?;
        let decoded = BASE64
            .decode(encoded.trim().as_bytes())
            .map_err(|_| CipherError::InvalidMasterKey)?;
        let key: [u8; MASTER_KEY_LEN] = decoded
            .try_into()
            .map_err(|_| CipherError::InvalidMasterKey)?;
        Ok(Self::from_key(key))
    }

    pub fn from_key(key: [u8; MASTER_KEY_LEN]) -> Self {
        let key = Key::<Aes256Gcm>::from(key);
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    /// Encrypt with a freshly generated per-value nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedValue, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Crypto)?;

        Ok(EncryptedValue {
            nonce_b64: BASE64.encode(nonce_bytes),
            ciphertext_b64: BASE64.encode(ciphertext),
        })
    }

    /// Decrypt and authenticate. Any tampering (ciphertext or tag) fails.
    pub fn decrypt(&self, value: &EncryptedValue) -> Result<String, CipherError> {
        let nonce_raw = BASE64
            .decode(value.nonce_b64.as_bytes())
            .map_err(|_| CipherError::Crypto)?;
        if nonce_raw.len() != NONCE_LEN {
            return Err(CipherError::Crypto);
        }
        let nonce = Nonce::from_slice(&nonce_raw);
        let ciphertext = BASE64
            .decode(value.ciphertext_b64.as_bytes())
            .map_err(|_| CipherError::Crypto)?;
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| CipherError::Crypto)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Crypto)
    }
}
