//! eth-verify CLI
//!
//! Usage:
//!   eth-verify generate -n 3
//!   eth-verify address --private-key <HEX>
//!   eth-verify verify -k <PUBKEY> -a 0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf
//!   eth-verify encrypt -k <PUBKEY> [-a <ACCOUNT>] [--base64] "hello"
//!   eth-verify decrypt -k <PRIVKEY> [-a <ACCOUNT>] [--base64] <CIPHERTEXT>

use std::process;

use clap::Parser;
use tracing::{debug, error};

use eth_verify::config::Command;
use eth_verify::{generate_key_pair, AccountInfo, Config, Verifier};

fn main() {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .init();

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("configuration error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(config.command) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(command: Command) -> eth_verify::Result<()> {
    match command {
        Command::Generate { count } => {
            for index in 1..=count {
                let account = generate_key_pair()?;
                print_account(&account, index);
            }
        }
        Command::Address(keys) => {
            println!("{}", keys.verifier()?.address());
        }
        Command::Verify {
            public_key,
            account,
        } => {
            Verifier::import_public_key(&public_key)?.verify_account(&account)?;
            println!("OK {}", account);
        }
        Command::Encrypt {
            public_key,
            account,
            base64,
            plaintext,
        } => {
            let verifier = Verifier::import_public_key(&public_key)?;
            let ciphertext = match (&account, base64) {
                (Some(account), false) => verifier.encrypt_with_check(account, &plaintext)?,
                (Some(account), true) => {
                    verifier.verify_account(account)?;
                    verifier.encrypt_base64(&plaintext)?
                }
                (None, false) => verifier.encrypt(&plaintext)?,
                (None, true) => verifier.encrypt_base64(&plaintext)?,
            };
            debug!(len = ciphertext.len(), base64, "encrypted message");
            println!("{}", ciphertext);
        }
        Command::Decrypt {
            private_key,
            account,
            base64,
            ciphertext,
        } => {
            let verifier = Verifier::import_private_key(&private_key)?;
            let plaintext = match (&account, base64) {
                (Some(account), false) => verifier.decrypt_with_check(account, &ciphertext)?,
                (Some(account), true) => {
                    verifier.verify_account(account)?;
                    verifier.decrypt_base64(&ciphertext)?
                }
                (None, false) => verifier.decrypt(&ciphertext)?,
                (None, true) => verifier.decrypt_base64(&ciphertext)?,
            };
            println!("{}", plaintext);
        }
    }

    Ok(())
}

fn print_account(account: &AccountInfo, index: usize) {
    println!("=== Account #{} ===", index);
    println!("Address:     {}", account.address());
    println!("Private Key: {}", account.private_key());
    println!("Public Key:  {}", account.public_key());
    println!();
}
