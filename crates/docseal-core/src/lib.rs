//! docseal_core — password-sealed RSA keys, document signatures, trust levels
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize private key material and derived keys on drop.
//! - Never log plaintext, passwords, derived keys, PEMs or signatures.
//! - No process-wide state: callers construct a [`SealEngine`] and pass it on.
//!
//! # Module layout
//! - `keypair`   — RSA-2048 generation, PKCS#8 / SPKI PEM export
//! - `kdf`       — PBKDF2-HMAC-SHA256 envelope keys, salts
//! - `envelope`  — AES-256-GCM private key envelope (salt | nonce | tag | ciphertext)
//! - `signing`   — RSA-PSS (SHA-256, max salt) sign / verify
//! - `codec`     — signature block embedding and extraction
//! - `trust`     — candidate scan and GREEN / YELLOW / RED classification
//! - `engine`    — `SealEngine`: registration, sign, verify, re-seal pipelines
//! - `settings`  — tunables loaded from JSON
//! - `error`     — unified error type

pub mod codec;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod keypair;
pub mod settings;
pub mod signing;
pub mod trust;

pub use engine::{KeyPairRecord, Registration, SealEngine, SignedDocument, VerificationReport};
pub use error::{Result, SealError};
pub use settings::SealSettings;
pub use signing::Verification;
pub use trust::{AcceptedRelationships, CandidateKey, RelationshipOracle, TrustLevel, TrustReason};
