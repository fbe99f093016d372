use thiserror::Error;

pub type Result<T> = std::result::Result<T, SealError>;

/// Every failure the engine can surface.
///
/// Messages are safe to show to a caller: they never carry plaintext,
/// passwords, derived keys or raw backend error text.
#[derive(Debug, Error)]
pub enum SealError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Malformed private key envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Envelope salt does not match the stored salt")]
    SaltMismatch,

    /// Wrong password and tampered blob are deliberately indistinguishable.
    #[error("Private key envelope failed authentication")]
    Authentication,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Public key could not be parsed: {0}")]
    KeyParse(String),

    #[error("Signature is not valid base64")]
    Encoding(#[from] base64::DecodeError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Settings could not be read: {0}")]
    Settings(String),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}
