//! Cryptographic building blocks.
//!
//! This module provides:
//! - Ethereum address derivation using Keccak-256
//! - Random account generation on secp256k1
//! - The ECIES envelope used for public-key encryption

mod address;
pub mod ecies;
mod keypair;

pub use address::Address;
pub(crate) use address::strip_hex_prefix;
pub use keypair::{generate_key_pair, AccountInfo};

use tiny_keccak::{Hasher, Keccak};

/// Legacy Keccak-256 (pre-SHA-3 padding) of arbitrary bytes.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(input);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}
