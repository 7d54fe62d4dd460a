//! Secret records and display masking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use staffsight_core::{TenantId, UserId};

use crate::cipher::EncryptedValue;

/// One stored credential, unique per `(tenant, service, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub tenant_id: TenantId,
    /// Integration the credential belongs to (e.g. `"n8n"`).
    pub service: String,
    /// Key within the service (e.g. `"webhook_url"`, `"auth_header_value"`).
    pub key: String,
    pub value: EncryptedValue,
    /// Sensitive values are never echoed back, even masked.
    pub sensitive: bool,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
}

/// Admin-surface view of a secret. Carries no plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskedSecret {
    pub key: String,
    pub masked_value: String,
    pub sensitive: bool,
    pub updated_at: DateTime<Utc>,
}

/// Reveal only the trailing 4 characters; anything of 4 characters or fewer
/// masks entirely.
pub fn mask_secret(plaintext: &str) -> String {
    let chars: Vec<char> = plaintext.chars().collect();
    if chars.len() <= 4 {
        return "••••".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("••••{tail}")
}
