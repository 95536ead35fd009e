//! Command line configuration for the `eth-verify` binary.

use clap::{Args, Parser, Subcommand};

use crate::crypto::Address;
use crate::error::Error;
use crate::verifier::Verifier;

/// secp256k1 account encryption and Ethereum address verification
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Enable debug logging
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate new random accounts
    Generate {
        /// Number of accounts to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Print the checksum address of a key
    Address(KeyArgs),

    /// Check that a public key belongs to an account
    Verify {
        /// Public key (hex, compressed or uncompressed)
        #[arg(short = 'k', long)]
        public_key: String,

        /// Account address (0x-prefixed, any case)
        #[arg(short, long)]
        account: String,
    },

    /// Encrypt a message to a public key
    Encrypt {
        /// Public key (hex, compressed or uncompressed)
        #[arg(short = 'k', long)]
        public_key: String,

        /// Refuse to encrypt unless the key belongs to this account
        #[arg(short, long)]
        account: Option<String>,

        /// Emit base64 instead of hex
        #[arg(short, long, default_value = "false")]
        base64: bool,

        /// Message to encrypt
        plaintext: String,
    },

    /// Decrypt a message with a private key
    Decrypt {
        /// Private key (64 hex characters)
        #[arg(short = 'k', long)]
        private_key: String,

        /// Refuse to decrypt unless the key belongs to this account
        #[arg(short, long)]
        account: Option<String>,

        /// Ciphertext is base64 instead of hex
        #[arg(short, long, default_value = "false")]
        base64: bool,

        /// Ciphertext to decrypt
        ciphertext: String,
    },
}

/// Exactly one of a public or private key.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct KeyArgs {
    /// Public key (hex, compressed or uncompressed)
    #[arg(long)]
    pub public_key: Option<String>,

    /// Private key (64 hex characters)
    #[arg(long)]
    pub private_key: Option<String>,
}

impl KeyArgs {
    /// Imports whichever key was given, preferring the public key.
    pub fn verifier(&self) -> crate::Result<Verifier> {
        if let Some(key) = &self.public_key {
            Verifier::import_public_key(key)
        } else if let Some(key) = &self.private_key {
            Verifier::import_private_key(key)
        } else {
            Err(Error::MissingKey("public or private key"))
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.command {
            Command::Generate { count } => {
                if *count == 0 {
                    return Err(ConfigError::InvalidCount);
                }
            }
            Command::Verify { account, .. } => validate_account(account)?,
            Command::Encrypt { account, .. } | Command::Decrypt { account, .. } => {
                if let Some(account) = account {
                    validate_account(account)?;
                }
            }
            Command::Address(_) => {}
        }

        Ok(())
    }

    /// Returns the log level selected by `--verbose`.
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Accounts are compared with their `0x` prefix, so a bare address can never
/// verify.
fn validate_account(account: &str) -> Result<(), ConfigError> {
    if !account.starts_with("0x") && !account.starts_with("0X") {
        return Err(ConfigError::InvalidAccount(format!(
            "{}: missing 0x prefix",
            account
        )));
    }
    account
        .parse::<Address>()
        .map_err(|e| ConfigError::InvalidAccount(format!("{}: {}", account, e)))?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid account: {0}")]
    InvalidAccount(String),
    #[error("Count must be at least 1")]
    InvalidCount,
}
