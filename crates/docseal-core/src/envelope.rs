//! Private key envelope.
//!
//! AES-256-GCM under a PBKDF2-HMAC-SHA256 key derived from the user's
//! password and per-user salt. Key: 32 bytes. Nonce: 12 bytes (random,
//! fresh per seal). Tag: 16 bytes.
//!
//! Blob wire format (base64 of):
//!   [ salt (16) | nonce (12) | tag (16) | ciphertext ]
//!
//! The salt is carried redundantly so a blob opened with the wrong user's
//! salt is rejected before any KDF work.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{Result, SealError};
use crate::kdf::{constant_time_eq, envelope_key_from_password, SALT_LEN};

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

const NONCE_OFFSET: usize = SALT_LEN;
const TAG_OFFSET: usize = NONCE_OFFSET + NONCE_LEN;

/// Seal `private_key` under `password`, returning the base64 blob.
pub fn seal_private_key(
    private_key: &[u8],
    password: &str,
    salt: &[u8; SALT_LEN],
    kdf_iterations: u32,
) -> Result<String> {
    let key = envelope_key_from_password(password.as_bytes(), salt, kdf_iterations);
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| SealError::MalformedEnvelope("envelope key length".into()))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let mut buffer = Zeroizing::new(private_key.to_vec());
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", buffer.as_mut_slice())
        .map_err(|_| SealError::MalformedEnvelope("private key too large to seal".into()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + buffer.len());
    out.extend_from_slice(salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&tag);
    out.extend_from_slice(&buffer);

    debug!(ciphertext_len = buffer.len(), "sealed private key");
    Ok(general_purpose::STANDARD.encode(out))
}

/// Open a blob produced by [`seal_private_key`].
///
/// Checks run in order: decoding and length, salt, then authentication.
pub fn open_private_key(
    blob: &str,
    password: &str,
    expected_salt: &[u8; SALT_LEN],
    kdf_iterations: u32,
) -> Result<Zeroizing<Vec<u8>>> {
    let data = general_purpose::STANDARD
        .decode(blob.trim())
        .map_err(|_| SealError::MalformedEnvelope("blob is not valid base64".into()))?;
    if data.len() < HEADER_LEN {
        warn!(len = data.len(), "rejected truncated private key envelope");
        return Err(SealError::MalformedEnvelope(format!(
            "blob is {} bytes, header alone is {HEADER_LEN}",
            data.len()
        )));
    }

    let stored_salt = &data[..NONCE_OFFSET];
    let nonce = &data[NONCE_OFFSET..TAG_OFFSET];
    let tag = &data[TAG_OFFSET..HEADER_LEN];
    let ciphertext = &data[HEADER_LEN..];

    if !constant_time_eq(stored_salt, expected_salt) {
        warn!("private key envelope salt does not match stored salt");
        return Err(SealError::SaltMismatch);
    }

    let key = envelope_key_from_password(password.as_bytes(), expected_salt, kdf_iterations);
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| SealError::MalformedEnvelope("envelope key length".into()))?;

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            buffer.as_mut_slice(),
            Tag::from_slice(tag),
        )
        .map_err(|_| {
            warn!("private key envelope failed authentication");
            SealError::Authentication
        })?;

    debug!(plaintext_len = buffer.len(), "opened private key");
    Ok(buffer)
}
