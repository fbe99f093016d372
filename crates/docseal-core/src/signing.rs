//! RSA-PSS document signatures.
//!
//! The signed message is the SHA-256 digest of the raw document bytes, signed
//! with PSS over SHA-256 (MGF1-SHA-256) and the maximum salt length the
//! modulus allows. Signatures travel as standard padded base64.

use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rsa::pss::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::PublicKeyParts;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, SealError};
use crate::keypair::{parse_private_key, parse_public_key};

/// Outcome of checking one signature against one public key.
///
/// A signature that simply does not verify is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    Verified,
    Mismatch,
}

impl Verification {
    pub fn is_verified(self) -> bool {
        matches!(self, Verification::Verified)
    }
}

pub fn document_digest(document: &[u8]) -> [u8; 32] {
    Sha256::digest(document).into()
}

/// Largest PSS salt for a SHA-256 signature under `key`: emLen - hLen - 2.
fn max_salt_len(key: &impl PublicKeyParts) -> usize {
    let em_bits = key.n().bits().saturating_sub(1);
    let em_len = (em_bits + 7) / 8;
    em_len.saturating_sub(Sha256::output_size() + 2)
}

/// Sign `document` with a PKCS#8 PEM private key; returns base64.
pub fn sign_document(document: &[u8], private_key_pem: &str) -> Result<String> {
    let private_key = parse_private_key(private_key_pem)?;
    let salt_len = max_salt_len(&private_key);
    let signing_key = SigningKey::<Sha256>::new_with_salt_len(private_key, salt_len);

    let digest = document_digest(document);
    let signature = signing_key
        .try_sign_with_rng(&mut OsRng, &digest)
        .map_err(|_| SealError::Signing("RSA-PSS signing failed".into()))?;

    debug!(document_len = document.len(), "signed document");
    Ok(general_purpose::STANDARD
        .encode(signature.to_bytes())
        .trim()
        .to_string())
}

/// Check `signature_b64` over `document` against a SubjectPublicKeyInfo PEM.
///
/// Malformed key PEM and malformed base64 are structural errors; anything
/// else that fails to verify is [`Verification::Mismatch`].
pub fn verify_signature(
    document: &[u8],
    signature_b64: &str,
    public_key_pem: &str,
) -> Result<Verification> {
    let public_key = parse_public_key(public_key_pem)?;
    let signature_bytes = general_purpose::STANDARD.decode(signature_b64.trim())?;

    let salt_len = max_salt_len(&public_key);
    let verifying_key = VerifyingKey::<Sha256>::new_with_salt_len(public_key, salt_len);

    let signature = match Signature::try_from(signature_bytes.as_slice()) {
        Ok(signature) => signature,
        Err(_) => return Ok(Verification::Mismatch),
    };

    let digest = document_digest(document);
    match verifying_key.verify(&digest, &signature) {
        Ok(()) => Ok(Verification::Verified),
        Err(_) => Ok(Verification::Mismatch),
    }
}
