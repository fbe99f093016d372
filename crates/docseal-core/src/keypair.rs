//! RSA key pair generation and PEM handling.
//!
//! The private half is exported as unencrypted PKCS#8 PEM: at-rest protection
//! is entirely the envelope layer's job, so there is one encryption scheme
//! rather than two. The public half is SubjectPublicKeyInfo PEM.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::{Result, SealError};

/// Freshly generated key pair, both halves PEM encoded.
pub struct GeneratedKeyPair {
    pub public_key_pem: String,
    pub private_key_pem: Zeroizing<String>,
}

impl std::fmt::Debug for GeneratedKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKeyPair")
            .field("public_key_pem", &self.public_key_pem)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// Generate an RSA key pair with public exponent 65537.
pub fn generate_key_pair(bits: usize) -> Result<GeneratedKeyPair> {
    let private_key = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|_| SealError::KeyGeneration("RSA key generation failed".into()))?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|_| SealError::KeyGeneration("PKCS#8 export failed".into()))?;
    let public_key_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|_| SealError::KeyGeneration("public key export failed".into()))?;

    Ok(GeneratedKeyPair {
        public_key_pem,
        private_key_pem,
    })
}

pub(crate) fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .map_err(|_| SealError::Signing("private key is not a PKCS#8 RSA PEM".into()))
}

pub(crate) fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem.trim())
        .map_err(|_| SealError::KeyParse("not a SubjectPublicKeyInfo RSA PEM".into()))
}
