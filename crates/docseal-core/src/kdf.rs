//! Password-based key derivation for private key envelopes.
//!
//! `envelope_key_from_password` — PBKDF2-HMAC-SHA256, derives the 32-byte
//!   AES-256-GCM key that seals a user's private key.

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

pub const SALT_LEN: usize = 16;
pub const ENVELOPE_KEY_LEN: usize = 32;

/// 32-byte envelope key derived from a user password. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct EnvelopeKey([u8; ENVELOPE_KEY_LEN]);

impl EnvelopeKey {
    pub fn as_bytes(&self) -> &[u8; ENVELOPE_KEY_LEN] {
        &self.0
    }
}

/// Derive an envelope key from a password + 16-byte salt.
pub fn envelope_key_from_password(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    iterations: u32,
) -> EnvelopeKey {
    let mut output = [0u8; ENVELOPE_KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut output);
    EnvelopeKey(output)
}

/// Generate a fresh random 16-byte salt (once per user, at registration).
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Equality that does not short-circuit on the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
