//! `staffsight-vault` — authenticated-encryption store for third-party
//! credentials (API keys, webhook URLs, shared secrets).
//!
//! Values are encrypted with AES-256-GCM under a process-wide master key that
//! never touches the store. Reads fail closed: any lookup or cryptographic
//! failure surfaces as "not configured" (`None`), never as an error that
//! could crash a request path.

pub mod cache;
pub mod cipher;
pub mod secret;
pub mod store;
pub mod vault;

pub use cache::SecretCache;
pub use cipher::{CipherError, EncryptedValue, SecretCipher};
pub use secret::{mask_secret, MaskedSecret, SecretRecord};
pub use store::{InMemorySecretStore, SecretStore, SecretStoreError};
pub use vault::{SecretsVault, VaultError};
