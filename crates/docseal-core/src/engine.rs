use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::codec::{embed_signature, extract_signature};
use crate::envelope::{open_private_key, seal_private_key};
use crate::error::{Result, SealError};
use crate::kdf::{generate_salt, SALT_LEN};
use crate::keypair::{generate_key_pair, GeneratedKeyPair};
use crate::settings::SealSettings;
use crate::signing::sign_document;
use crate::trust::{classify, CandidateKey, RelationshipOracle, TrustLevel, TrustReason};

/// Stored key pair row: public PEM plus the sealed private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPairRecord {
    pub owner_id: Uuid,
    pub public_key_pem: String,
    pub encrypted_private_key: String,
}

impl From<&KeyPairRecord> for CandidateKey {
    fn from(record: &KeyPairRecord) -> Self {
        CandidateKey {
            owner_id: record.owner_id,
            public_key_pem: record.public_key_pem.clone(),
        }
    }
}

/// Everything the caller must persist for a newly registered user.
#[derive(Debug, Clone)]
pub struct Registration {
    pub key_pair: KeyPairRecord,
    pub encryption_salt: [u8; SALT_LEN],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDocument {
    pub owner_id: Uuid,
    pub filename: String,
    pub content: Vec<u8>,
    pub signature: String,
    pub composite: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub verified: bool,
    pub signer_id: Option<Uuid>,
    pub trust_level: TrustLevel,
    pub reason: TrustReason,
    pub message: String,
}

impl VerificationReport {
    fn new(signer_id: Option<Uuid>, reason: TrustReason) -> Self {
        Self {
            verified: signer_id.is_some(),
            signer_id,
            trust_level: reason.level(),
            reason,
            message: reason.message().to_string(),
        }
    }
}

/// Stateless signing engine. Holds only its settings, so one value can be
/// shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct SealEngine {
    settings: SealSettings,
}

impl SealEngine {
    pub fn new(settings: SealSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &SealSettings {
        &self.settings
    }

    pub fn generate_key_pair(&self) -> Result<GeneratedKeyPair> {
        generate_key_pair(self.settings.rsa_key_bits)
    }

    pub fn encrypt_private_key(
        &self,
        private_key_pem: &str,
        password: &str,
        salt: &[u8; SALT_LEN],
    ) -> Result<String> {
        seal_private_key(
            private_key_pem.as_bytes(),
            password,
            salt,
            self.settings.kdf_iterations,
        )
    }

    pub fn decrypt_private_key(
        &self,
        blob: &str,
        password: &str,
        salt: &[u8; SALT_LEN],
    ) -> Result<Zeroizing<Vec<u8>>> {
        open_private_key(blob, password, salt, self.settings.kdf_iterations)
    }

    /// Re-seal a private key under a new password, keeping the salt.
    ///
    /// Must run whenever the password the blob was sealed with changes,
    /// otherwise the old blob can no longer be opened.
    pub fn rewrap_private_key(
        &self,
        blob: &str,
        old_password: &str,
        new_password: &str,
        salt: &[u8; SALT_LEN],
    ) -> Result<String> {
        let private_key = self.decrypt_private_key(blob, old_password, salt)?;
        let rewrapped = seal_private_key(
            &private_key,
            new_password,
            salt,
            self.settings.kdf_iterations,
        )?;
        debug!("re-sealed private key under new password");
        Ok(rewrapped)
    }

    /// Generate salt and key pair for `owner` and seal the private half.
    pub fn register(&self, owner_id: Uuid, password: &str) -> Result<Registration> {
        let encryption_salt = generate_salt();
        let pair = self.generate_key_pair()?;
        let encrypted_private_key =
            self.encrypt_private_key(&pair.private_key_pem, password, &encryption_salt)?;
        info!(owner = %owner_id, bits = self.settings.rsa_key_bits, "registered signing key");
        Ok(Registration {
            key_pair: KeyPairRecord {
                owner_id,
                public_key_pem: pair.public_key_pem,
                encrypted_private_key,
            },
            encryption_salt,
        })
    }

    /// Open the owner's private key, sign `content` and embed the signature.
    pub fn sign_document(
        &self,
        record: &KeyPairRecord,
        password: &str,
        salt: &[u8; SALT_LEN],
        filename: &str,
        content: &[u8],
    ) -> Result<SignedDocument> {
        let private_key = self.decrypt_private_key(&record.encrypted_private_key, password, salt)?;
        let private_key_pem = std::str::from_utf8(&private_key)
            .map_err(|_| SealError::Signing("opened private key is not PEM text".into()))?;
        let signature = sign_document(content, private_key_pem)?;
        let composite = embed_signature(content, &signature);

        info!(owner = %record.owner_id, document_len = content.len(), "signed document");
        Ok(SignedDocument {
            owner_id: record.owner_id,
            filename: format!("signed_{filename}"),
            content: content.to_vec(),
            signature,
            composite,
        })
    }

    /// Extract the signature from `composite`, find its signer among
    /// `candidates` and classify the result for `requester`.
    pub fn verify_document<'a, I, R>(
        &self,
        composite: &[u8],
        requester: &Uuid,
        candidates: I,
        relationships: &R,
    ) -> Result<VerificationReport>
    where
        I: IntoIterator<Item = &'a CandidateKey>,
        R: RelationshipOracle + ?Sized,
    {
        let Some(extracted) = extract_signature(composite) else {
            debug!(composite_len = composite.len(), "no signature block found");
            return Ok(VerificationReport::new(None, TrustReason::NoSignature));
        };

        let classification = match classify(
            &extracted.original,
            &extracted.signature,
            requester,
            candidates,
            relationships,
        ) {
            Ok(classification) => classification,
            Err(SealError::Encoding(_)) => {
                debug!("embedded signature is not valid base64");
                return Ok(VerificationReport::new(None, TrustReason::NoMatchingSigner));
            }
            Err(e) => return Err(e),
        };

        info!(
            requester = %requester,
            level = ?classification.level(),
            "classified signed document"
        );
        Ok(VerificationReport::new(
            classification.signer_id,
            classification.reason,
        ))
    }
}
