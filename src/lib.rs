//! # eth_verify
//!
//! secp256k1 account encryption and Ethereum address verification.
//!
//! ## Architecture
//!
//! - `crypto`: Address derivation, account generation and the ECIES envelope
//! - `verifier`: Imported key context exposing encrypt/decrypt/verify
//! - `config`: Command line configuration for the `eth-verify` binary
//! - `error`: Error taxonomy shared by every operation
//!
//! ## Example
//!
//! ```
//! use eth_verify::{generate_key_pair, Verifier};
//!
//! let account = generate_key_pair().unwrap();
//! let sender = Verifier::import_public_key(account.public_key()).unwrap();
//! let receiver = Verifier::import_private_key(account.private_key()).unwrap();
//!
//! let address = account.address().to_checksum();
//! let ciphertext = sender.encrypt_with_check(&address, "hello").unwrap();
//! assert_eq!(receiver.decrypt_with_check(&address, &ciphertext).unwrap(), "hello");
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod verifier;

pub use config::Config;
pub use crypto::{generate_key_pair, AccountInfo, Address};
pub use error::{Error, Result};
pub use verifier::Verifier;
