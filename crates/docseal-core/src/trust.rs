//! Trust classification for verified documents.
//!
//! Candidates are scanned in the order the caller supplies them and the first
//! key that verifies names the signer. The scan is linear in the number of
//! known keys; there is no fingerprint index.
//!
//! | signer found | signer == requester | accepted relationship | level  |
//! |--------------|---------------------|-----------------------|--------|
//! | no           | -                   | (not queried)         | RED    |
//! | yes          | yes                 | (not queried)         | GREEN  |
//! | yes          | no                  | yes                   | GREEN  |
//! | yes          | no                  | no                    | YELLOW |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, SealError};
use crate::signing::verify_signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Green,
    Yellow,
    Red,
}

/// Why a document received its trust level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustReason {
    NoSignature,
    NoMatchingSigner,
    SelfSigned,
    TrustedPartner,
    NoRelationship,
}

impl TrustReason {
    pub fn level(self) -> TrustLevel {
        match self {
            TrustReason::NoSignature | TrustReason::NoMatchingSigner => TrustLevel::Red,
            TrustReason::SelfSigned | TrustReason::TrustedPartner => TrustLevel::Green,
            TrustReason::NoRelationship => TrustLevel::Yellow,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            TrustReason::NoSignature => "No signature found in the document",
            TrustReason::NoMatchingSigner => "Invalid signature - no matching signer found",
            TrustReason::SelfSigned => "Signature is valid - this is your signature",
            TrustReason::TrustedPartner => "Signature is valid - signed by your contract partner",
            TrustReason::NoRelationship => {
                "Signature is valid but you have no contract relationship with the signer"
            }
        }
    }
}

/// One public key the collaborator knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateKey {
    pub owner_id: Uuid,
    pub public_key_pem: String,
}

/// Answers "does an accepted agreement exist between these two users".
pub trait RelationshipOracle {
    fn has_accepted_relationship(&self, requester: &Uuid, signer: &Uuid) -> bool;
}

impl<F> RelationshipOracle for F
where
    F: Fn(&Uuid, &Uuid) -> bool,
{
    fn has_accepted_relationship(&self, requester: &Uuid, signer: &Uuid) -> bool {
        self(requester, signer)
    }
}

/// In-memory set of accepted agreements. An agreement accepted in either
/// direction relates both users.
#[derive(Debug, Clone, Default)]
pub struct AcceptedRelationships {
    pairs: HashSet<(Uuid, Uuid)>,
}

impl AcceptedRelationships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, sender: Uuid, receiver: Uuid) {
        self.pairs.insert(ordered(sender, receiver));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(Uuid, Uuid)> for AcceptedRelationships {
    fn from_iter<I: IntoIterator<Item = (Uuid, Uuid)>>(iter: I) -> Self {
        let mut relationships = Self::new();
        for (sender, receiver) in iter {
            relationships.accept(sender, receiver);
        }
        relationships
    }
}

impl RelationshipOracle for AcceptedRelationships {
    fn has_accepted_relationship(&self, requester: &Uuid, signer: &Uuid) -> bool {
        self.pairs.contains(&ordered(*requester, *signer))
    }
}

fn ordered(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub signer_id: Option<Uuid>,
    pub reason: TrustReason,
}

impl Classification {
    pub fn level(&self) -> TrustLevel {
        self.reason.level()
    }
}

/// Return the owner of the first candidate whose key verifies `signature_b64`.
///
/// A candidate with an unparseable stored key is skipped. Invalid base64 in
/// the signature fails every candidate equally and is returned as an error.
pub fn find_signer<'a, I>(document: &[u8], signature_b64: &str, candidates: I) -> Result<Option<Uuid>>
where
    I: IntoIterator<Item = &'a CandidateKey>,
{
    let mut scanned = 0usize;
    for candidate in candidates {
        scanned += 1;
        match verify_signature(document, signature_b64, &candidate.public_key_pem) {
            Ok(outcome) if outcome.is_verified() => {
                debug!(signer = %candidate.owner_id, scanned, "signature matched candidate key");
                return Ok(Some(candidate.owner_id));
            }
            Ok(_) => {}
            Err(SealError::KeyParse(_)) => {
                warn!(owner = %candidate.owner_id, "skipping candidate with unparseable public key");
            }
            Err(e) => return Err(e),
        }
    }
    debug!(scanned, "no candidate key matched signature");
    Ok(None)
}

/// Classify an extracted document for `requester`.
pub fn classify<'a, I, R>(
    document: &[u8],
    signature_b64: &str,
    requester: &Uuid,
    candidates: I,
    relationships: &R,
) -> Result<Classification>
where
    I: IntoIterator<Item = &'a CandidateKey>,
    R: RelationshipOracle + ?Sized,
{
    let Some(signer) = find_signer(document, signature_b64, candidates)? else {
        return Ok(Classification {
            signer_id: None,
            reason: TrustReason::NoMatchingSigner,
        });
    };

    let reason = if signer == *requester {
        TrustReason::SelfSigned
    } else if relationships.has_accepted_relationship(requester, &signer) {
        TrustReason::TrustedPartner
    } else {
        TrustReason::NoRelationship
    };

    Ok(Classification {
        signer_id: Some(signer),
        reason,
    })
}
