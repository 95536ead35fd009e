//! Account key-pair generation.

use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tracing::debug;

use super::Address;
use crate::error::{Error, Result};
use crate::verifier::Verifier;

/// A freshly generated account: hex-encoded private and public keys.
///
/// Both strings are lowercase hex without the `0x` prefix. The public key is
/// the 65-byte uncompressed form, so it keeps its leading `04` byte.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountInfo {
    private_key: String,
    public_key: String,
    address: Address,
}

impl AccountInfo {
    /// Generates a new random account.
    ///
    /// Uses a cryptographically secure random number generator.
    pub fn generate() -> Result<Self> {
        let secret_key = random_secret_key()?;
        let public_key = PublicKey::from_secret_key(&Secp256k1::new(), &secret_key);

        let account = Self {
            private_key: hex::encode(secret_key.secret_bytes()),
            public_key: hex::encode(public_key.serialize_uncompressed()),
            address: Address::from_public_key(&public_key),
        };
        debug!(address = %account.address(), "generated account");
        Ok(account)
    }

    /// Returns the private key (64 hex characters).
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Returns the uncompressed public key (130 hex characters).
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Returns the address derived from the public key.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns a key-pair [`Verifier`] for this account.
    pub fn verifier(&self) -> Result<Verifier> {
        Verifier::import_private_key(&self.private_key)
    }
}

impl std::fmt::Debug for AccountInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountInfo")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .field("address", &self.address)
            .finish()
    }
}

/// Generates a new random account.
pub fn generate_key_pair() -> Result<AccountInfo> {
    AccountInfo::generate()
}

/// Draws 32 random bytes until they form a valid scalar.
///
/// A draw falls outside `[1, n)` with probability below 2^-127, so the loop
/// is bounded in practice.
fn random_secret_key() -> Result<SecretKey> {
    use rand::RngCore;

    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; 32];
    loop {
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| Error::KeyGen(e.to_string()))?;
        if let Ok(secret_key) = SecretKey::from_slice(&bytes) {
            return Ok(secret_key);
        }
    }
}
