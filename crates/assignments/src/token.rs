//! Bearer token generation for form links.

use rand::rngs::OsRng;
use rand::RngCore;

/// Raw entropy per token. 32 bytes, hex-encoded to 64 characters.
pub const TOKEN_BYTES: usize = 32;

/// Fixed token lifetime.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Generate a fresh opaque bearer token.
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
