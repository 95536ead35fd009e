//! ECIES envelope over secp256k1.
//!
//! Byte-compatible with the pyelliptic layout used by the common secp256k1
//! toolkits:
//!
//! ```text
//! IV (16) || curve id 0x02CA (2) || 0x0020 (2) || X (32) || 0x0020 (2) || Y (32)
//!         || AES-256-CBC ciphertext, PKCS#7 padded || HMAC-SHA256 (32)
//! ```
//!
//! `X`/`Y` are the coordinates of a fresh ephemeral public key. The shared
//! secret is the x-coordinate of the ECDH point as a minimal big-endian
//! integer (leading zero bytes dropped); `SHA-512` of it yields the
//! encryption key (first half) and the MAC key (second half). The MAC covers
//! every byte before it.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use secp256k1::{ecdh, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256, Sha512};
use tracing::trace;

use crate::error::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;
const MAC_LEN: usize = 32;
const COORD_LEN: usize = 32;

/// secp256k1 in the OpenSSL curve numbering (NID 714).
const CURVE_ID: [u8; 2] = [0x02, 0xca];
const COORD_LEN_BYTES: [u8; 2] = [0x00, 0x20];

/// Curve id, two coordinate lengths and both coordinates.
const PUBKEY_LEN: usize = 2 + 2 + COORD_LEN + 2 + COORD_LEN;

/// Bytes added to the padded ciphertext.
pub const OVERHEAD: usize = IV_LEN + PUBKEY_LEN + MAC_LEN;

/// Smallest well-formed envelope: overhead plus one cipher block.
pub const MIN_LEN: usize = OVERHEAD + BLOCK_LEN;

/// Encrypts `plaintext` for `public_key`.
pub fn encrypt(public_key: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_rng(public_key, plaintext, &mut rand::thread_rng())
}

/// Encrypts `plaintext` for `public_key`, drawing the IV and the ephemeral
/// key from `rng`.
pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
    public_key: &PublicKey,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    rng.try_fill_bytes(&mut iv)
        .map_err(|e| Error::Encrypt(format!("IV generation failed: {}", e)))?;
    let ephemeral_secret = SecretKey::new(rng);

    seal(public_key, plaintext, &ephemeral_secret, &iv)
}

/// Builds the envelope from an explicit ephemeral key and IV.
fn seal(
    public_key: &PublicKey,
    plaintext: &[u8],
    ephemeral_secret: &SecretKey,
    iv: &[u8; IV_LEN],
) -> Result<Vec<u8>> {
    let ephemeral_public = PublicKey::from_secret_key(&Secp256k1::new(), ephemeral_secret);
    let (key_e, key_m) = derive_keys(public_key, ephemeral_secret);

    let ciphertext = Aes256CbcEnc::new(&key_e.into(), &(*iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    // Skip the 0x04 format byte, X and Y follow back to back
    let point = ephemeral_public.serialize_uncompressed();

    let mut out = Vec::with_capacity(OVERHEAD + ciphertext.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&CURVE_ID);
    out.extend_from_slice(&COORD_LEN_BYTES);
    out.extend_from_slice(&point[1..1 + COORD_LEN]);
    out.extend_from_slice(&COORD_LEN_BYTES);
    out.extend_from_slice(&point[1 + COORD_LEN..]);
    out.extend_from_slice(&ciphertext);

    let mut mac = <HmacSha256 as Mac>::new_from_slice(&key_m)
        .map_err(|e| Error::Encrypt(e.to_string()))?;
    mac.update(&out);
    out.extend_from_slice(&mac.finalize().into_bytes());

    trace!(plaintext_len = plaintext.len(), envelope_len = out.len(), "sealed envelope");
    Ok(out)
}

/// Opens an envelope produced by [`encrypt`] with the matching secret key.
pub fn decrypt(secret_key: &SecretKey, envelope: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < MIN_LEN {
        return Err(Error::Decrypt(format!(
            "ciphertext too short: {} bytes, need at least {}",
            envelope.len(),
            MIN_LEN
        )));
    }

    let (iv, rest) = envelope.split_at(IV_LEN);
    let (pubkey_block, rest) = rest.split_at(PUBKEY_LEN);
    let (body, tag) = rest.split_at(rest.len() - MAC_LEN);

    if pubkey_block[0..2] != CURVE_ID {
        return Err(Error::Decrypt("unsupported curve".into()));
    }
    if pubkey_block[2..4] != COORD_LEN_BYTES {
        return Err(Error::Decrypt("invalid X length".into()));
    }
    let x = &pubkey_block[4..4 + COORD_LEN];
    if pubkey_block[4 + COORD_LEN..6 + COORD_LEN] != COORD_LEN_BYTES {
        return Err(Error::Decrypt("invalid Y length".into()));
    }
    let y = &pubkey_block[6 + COORD_LEN..];

    let mut point = [0u8; 65];
    point[0] = 0x04;
    point[1..1 + COORD_LEN].copy_from_slice(x);
    point[1 + COORD_LEN..].copy_from_slice(y);
    let ephemeral_public = PublicKey::from_slice(&point)
        .map_err(|e| Error::Decrypt(format!("invalid ephemeral key: {}", e)))?;

    if body.len() % BLOCK_LEN != 0 {
        return Err(Error::Decrypt("ciphertext not padded to block size".into()));
    }

    let (key_e, key_m) = derive_keys(&ephemeral_public, secret_key);

    let mut mac = <HmacSha256 as Mac>::new_from_slice(&key_m)
        .map_err(|e| Error::Decrypt(e.to_string()))?;
    mac.update(&envelope[..envelope.len() - MAC_LEN]);
    mac.verify_slice(tag)
        .map_err(|_| Error::Decrypt("invalid MAC".into()))?;

    let mut iv_bytes = [0u8; IV_LEN];
    iv_bytes.copy_from_slice(iv);
    let plaintext = Aes256CbcDec::new(&key_e.into(), &iv_bytes.into())
        .decrypt_padded_vec_mut::<Pkcs7>(body)
        .map_err(|_| Error::Decrypt("invalid padding".into()))?;

    trace!(envelope_len = envelope.len(), plaintext_len = plaintext.len(), "opened envelope");
    Ok(plaintext)
}

/// Splits `SHA-512(ECDH x-coordinate)` into the cipher key and the MAC key.
///
/// The x-coordinate is hashed without its leading zero bytes.
fn derive_keys(public_key: &PublicKey, secret_key: &SecretKey) -> ([u8; 32], [u8; 32]) {
    let shared_point = ecdh::shared_secret_point(public_key, secret_key);
    let derived = Sha512::digest(shared_secret(&shared_point[..COORD_LEN]));

    let mut key_e = [0u8; 32];
    let mut key_m = [0u8; 32];
    key_e.copy_from_slice(&derived[..32]);
    key_m.copy_from_slice(&derived[32..]);
    (key_e, key_m)
}

/// Strips leading zero bytes from a big-endian coordinate.
fn shared_secret(x: &[u8]) -> &[u8] {
    let start = x.iter().position(|&b| b != 0).unwrap_or(x.len());
    &x[start..]
}
