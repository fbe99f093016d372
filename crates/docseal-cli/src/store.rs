use anyhow::{anyhow, Context, Result};
use docseal_core::kdf::SALT_LEN;
use docseal_core::{AcceptedRelationships, CandidateKey, KeyPairRecord, Registration};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// On-disk identity: the key pair row plus the user's envelope salt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityFile {
    pub key_pair: KeyPairRecord,
    pub encryption_salt: String,
}

impl IdentityFile {
    pub fn from_registration(registration: &Registration) -> Self {
        Self {
            key_pair: registration.key_pair.clone(),
            encryption_salt: hex::encode(registration.encryption_salt),
        }
    }

    pub fn salt(&self) -> Result<[u8; SALT_LEN]> {
        let bytes = hex::decode(&self.encryption_salt).map_err(|e| anyhow!("decode salt: {e}"))?;
        bytes
            .try_into()
            .map_err(|_| anyhow!("salt must be {SALT_LEN} bytes"))
    }
}

/// An accepted invitation between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedInvitation {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
}

pub fn load_identity(path: &Path) -> Result<IdentityFile> {
    let data = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parse {}", path.display()))
}

pub fn save_identity(path: &Path, identity: &IdentityFile) -> Result<()> {
    if path.exists() {
        return Err(anyhow!("{} already exists", path.display()));
    }
    let data = serde_json::to_vec_pretty(identity)?;
    std::fs::write(path, data).with_context(|| format!("write {}", path.display()))
}

pub fn replace_identity(path: &Path, identity: &IdentityFile) -> Result<()> {
    let data = serde_json::to_vec_pretty(identity)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, data).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))
}

/// Every identity file in `dir`, in file-name order.
pub fn load_keyring(dir: &Path) -> Result<Vec<CandidateKey>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("read keyring {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    paths.sort();

    let mut candidates = Vec::with_capacity(paths.len());
    for path in paths {
        let identity = load_identity(&path)?;
        candidates.push(CandidateKey::from(&identity.key_pair));
    }
    Ok(candidates)
}

pub fn load_relationships(path: Option<&Path>) -> Result<AcceptedRelationships> {
    let Some(path) = path else {
        return Ok(AcceptedRelationships::new());
    };
    let data = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let invitations: Vec<AcceptedInvitation> =
        serde_json::from_slice(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(invitations
        .into_iter()
        .map(|inv| (inv.sender_id, inv.receiver_id))
        .collect())
}
