//! Ethereum address representation and utilities.

use std::fmt;
use std::str::FromStr;

use secp256k1::PublicKey;

use super::keccak256;
use crate::error::Error;

/// An Ethereum address (20 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Creates an address from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derives the address of a secp256k1 public key.
    ///
    /// Process:
    /// 1. Serialize the public key in uncompressed form (65 bytes)
    /// 2. Remove the first byte (0x04 prefix)
    /// 3. Hash the remaining 64 bytes with Keccak-256
    /// 4. Take the last 20 bytes of the hash
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let public_key_bytes = public_key.serialize_uncompressed();
        let hash = keccak256(&public_key_bytes[1..]);

        let mut address_bytes = [0u8; 20];
        address_bytes.copy_from_slice(&hash[12..]);

        Self(address_bytes)
    }

    /// Returns the address as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the address as a lowercase hex string (without 0x prefix).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the address with 0x prefix.
    pub fn to_hex_prefixed(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// Returns the address with checksum encoding (EIP-55).
    pub fn to_checksum(&self) -> String {
        let hex_addr = self.to_hex();
        let hash = keccak256(hex_addr.as_bytes());

        let mut checksum = String::with_capacity(42);
        checksum.push_str("0x");

        for (i, c) in hex_addr.chars().enumerate() {
            let hash_byte = hash[i / 2];
            let hash_nibble = if i % 2 == 0 {
                hash_byte >> 4
            } else {
                hash_byte & 0x0f
            };

            if hash_nibble >= 8 {
                checksum.push(c.to_ascii_uppercase());
            } else {
                checksum.push(c);
            }
        }

        checksum
    }

    /// Compares against a textual account, ignoring ASCII case.
    ///
    /// The account must carry the `0x` prefix, as the checksum form does.
    pub fn matches_account(&self, account: &str) -> bool {
        account.eq_ignore_ascii_case(&self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parses a 40 hex character address, with or without `0x`, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_hex_prefix(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(body, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

/// Drops a leading `0x` or `0X`, if any.
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
