//! Error types shared by every operation in the crate.

/// Errors returned by key import, encryption, decryption and verification.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input was not valid hex (or base64 for the base64 variants).
    #[error("Decode error: {0}")]
    Decode(String),

    /// Bytes did not form a valid secp256k1 key.
    #[error("Invalid key: {0}")]
    KeyParse(#[from] secp256k1::Error),

    /// The operation needs a key the context does not hold.
    #[error("{0} required")]
    MissingKey(&'static str),

    /// The envelope could not be built.
    #[error("Encryption failed: {0}")]
    Encrypt(String),

    /// The ciphertext was rejected.
    #[error("Decryption failed: {0}")]
    Decrypt(String),

    /// The derived address did not match the supplied account.
    #[error("Verification failed: account {account} does not match {derived}")]
    Verification { account: String, derived: String },

    /// Random key generation failed.
    #[error("Key generation failed: {0}")]
    KeyGen(String),
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Decode(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Decode(e.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
