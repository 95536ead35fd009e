//! Key context for encryption, decryption and account verification.

use base64::{engine::general_purpose, Engine as _};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tracing::debug;

use crate::crypto::{ecies, strip_hex_prefix, Address};
use crate::error::{Error, Result};

/// Key material held by a [`Verifier`].
#[derive(Clone)]
enum KeyMaterial {
    /// Imported from a public key: can encrypt and verify.
    Public(PublicKey),
    /// Imported from a private key: can also decrypt.
    Pair { secret: SecretKey, public: PublicKey },
}

/// An imported secp256k1 key, public-only or a full key pair.
///
/// Immutable once built. Every context holds a public key, so encryption and
/// verification always work; decryption needs a context imported with
/// [`Verifier::import_private_key`].
#[derive(Clone)]
pub struct Verifier {
    keys: KeyMaterial,
}

impl Verifier {
    /// Imports a hex-encoded public key, compressed (33 bytes) or
    /// uncompressed (65 bytes).
    pub fn import_public_key(key: &str) -> Result<Self> {
        let bytes = hex::decode(strip_hex_prefix(key))?;
        let public = PublicKey::from_slice(&bytes)?;

        debug!(len = bytes.len(), "imported public key");
        Ok(Self {
            keys: KeyMaterial::Public(public),
        })
    }

    /// Imports a hex-encoded 32-byte private key and derives its public key.
    ///
    /// Scalars that are zero or not below the curve order are rejected.
    pub fn import_private_key(key: &str) -> Result<Self> {
        let bytes = hex::decode(strip_hex_prefix(key))?;
        let secret = SecretKey::from_slice(&bytes)?;
        let public = PublicKey::from_secret_key(&Secp256k1::new(), &secret);

        debug!("imported private key");
        Ok(Self {
            keys: KeyMaterial::Pair { secret, public },
        })
    }

    /// Returns the public key.
    pub fn public_key(&self) -> &PublicKey {
        match &self.keys {
            KeyMaterial::Public(public) | KeyMaterial::Pair { public, .. } => public,
        }
    }

    /// Returns the uncompressed public key as lowercase hex (130 characters).
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().serialize_uncompressed())
    }

    /// Returns true if this context can decrypt.
    pub fn has_private_key(&self) -> bool {
        matches!(self.keys, KeyMaterial::Pair { .. })
    }

    /// Returns the Ethereum address of the public key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self.public_key())
    }

    /// Encrypts `plaintext` to the public key, returning lowercase hex.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(hex::encode(self.seal(plaintext)?))
    }

    /// Encrypts `plaintext` to the public key, returning standard base64.
    pub fn encrypt_base64(&self, plaintext: &str) -> Result<String> {
        Ok(general_purpose::STANDARD.encode(self.seal(plaintext)?))
    }

    /// Like [`Verifier::encrypt`], but only after `account` verifies.
    pub fn encrypt_with_check(&self, account: &str, plaintext: &str) -> Result<String> {
        self.verify_account(account)?;
        self.encrypt(plaintext)
    }

    /// Decrypts a hex ciphertext produced by [`Verifier::encrypt`].
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let secret = self.secret_key()?;
        let envelope = hex::decode(ciphertext)?;
        open(secret, &envelope)
    }

    /// Decrypts a base64 ciphertext produced by [`Verifier::encrypt_base64`].
    pub fn decrypt_base64(&self, ciphertext: &str) -> Result<String> {
        let secret = self.secret_key()?;
        let envelope = general_purpose::STANDARD.decode(ciphertext)?;
        open(secret, &envelope)
    }

    /// Like [`Verifier::decrypt`], but only after `account` verifies.
    pub fn decrypt_with_check(&self, account: &str, ciphertext: &str) -> Result<String> {
        self.secret_key()?;
        self.verify_account(account)?;
        self.decrypt(ciphertext)
    }

    /// Checks that `account` is the address of this context's public key.
    ///
    /// `account` is compared against the `0x`-prefixed checksum address,
    /// ignoring case.
    pub fn verify_account(&self, account: &str) -> Result<()> {
        let derived = self.address();
        if !derived.matches_account(account) {
            debug!(account, derived = %derived, "account verification failed");
            return Err(Error::Verification {
                account: account.to_string(),
                derived: derived.to_checksum(),
            });
        }
        Ok(())
    }

    fn secret_key(&self) -> Result<&SecretKey> {
        match &self.keys {
            KeyMaterial::Pair { secret, .. } => Ok(secret),
            KeyMaterial::Public(_) => Err(Error::MissingKey("private key")),
        }
    }

    fn seal(&self, plaintext: &str) -> Result<Vec<u8>> {
        ecies::encrypt(self.public_key(), plaintext.as_bytes())
    }
}

fn open(secret: &SecretKey, envelope: &[u8]) -> Result<String> {
    let plaintext = ecies::decrypt(secret, envelope)?;
    String::from_utf8(plaintext).map_err(|e| Error::Decrypt(e.to_string()))
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("address", &self.address())
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_key_pair;
    use test_case::test_case;

    const SECRET_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const ADDRESS_ONE: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    fn pair() -> (Verifier, Verifier) {
        let account = generate_key_pair().unwrap();
        (
            Verifier::import_public_key(account.public_key()).unwrap(),
            Verifier::import_private_key(account.private_key()).unwrap(),
        )
    }

    #[test]
    fn test_hello_roundtrip() {
        let verifier = Verifier::import_private_key(SECRET_ONE).unwrap();
        let ciphertext = verifier.encrypt("hello").unwrap();

        assert_eq!(ciphertext.len() % 2, 0);
        assert_eq!(ciphertext.len(), 2 * (ecies::OVERHEAD + 16));
        assert!(ciphertext.chars().all(|c| !c.is_ascii_uppercase()));
        assert_eq!(verifier.decrypt(&ciphertext).unwrap(), "hello");
    }

    #[test]
    fn test_public_encrypts_private_decrypts() {
        let (public, private) = pair();
        let ciphertext = public.encrypt("transfer 10 to bob").unwrap();
        assert_eq!(private.decrypt(&ciphertext).unwrap(), "transfer 10 to bob");
    }

    #[test]
    fn test_unicode_roundtrip() {
        let (public, private) = pair();
        let plaintext = "héllo wörld ✓";
        let ciphertext = public.encrypt(plaintext).unwrap();
        assert_eq!(private.decrypt(&ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_base64_and_hex_carry_same_envelope() {
        let (public, private) = pair();
        let b64 = public.encrypt_base64("payload").unwrap();
        let hex_ct = public.encrypt("payload").unwrap();

        let from_b64 = general_purpose::STANDARD.decode(&b64).unwrap();
        let from_hex = hex::decode(&hex_ct).unwrap();
        assert_eq!(from_b64.len(), from_hex.len());

        assert_eq!(private.decrypt(&hex::encode(from_b64)).unwrap(), "payload");
        assert_eq!(private.decrypt_base64(&b64).unwrap(), "payload");
        assert_eq!(
            private
                .decrypt_base64(&general_purpose::STANDARD.encode(from_hex))
                .unwrap(),
            "payload"
        );
    }

    #[test]
    fn test_compressed_public_key_import() {
        let private = Verifier::import_private_key(SECRET_ONE).unwrap();
        let compressed = hex::encode(private.public_key().serialize());
        let public = Verifier::import_public_key(&compressed).unwrap();

        assert_eq!(public.public_key_hex(), private.public_key_hex());
        assert!(public.verify_account(ADDRESS_ONE).is_ok());
    }

    #[test]
    fn test_prefixed_hex_accepted() {
        let verifier = Verifier::import_private_key(&format!("0x{}", SECRET_ONE)).unwrap();
        assert_eq!(verifier.address().to_checksum(), ADDRESS_ONE);
    }

    #[test]
    fn test_verify_known_account() {
        let verifier = Verifier::import_private_key(SECRET_ONE).unwrap();
        assert!(verifier.verify_account(ADDRESS_ONE).is_ok());
        assert!(verifier.verify_account(&ADDRESS_ONE.to_lowercase()).is_ok());
    }

    #[test]
    fn test_verify_case_insensitive() {
        let (public, _) = pair();
        let address = public.address().to_checksum();
        assert!(public.verify_account(&address).is_ok());
        assert!(public.verify_account(&address.to_uppercase()).is_ok());
        assert!(public.verify_account(&address.to_lowercase()).is_ok());
    }

    #[test]
    fn test_verify_mismatch() {
        let (public, _) = pair();
        let (other, _) = pair();
        let err = public.verify_account(&other.address().to_checksum()).unwrap_err();
        assert!(matches!(err, Error::Verification { .. }));

        let err = public
            .verify_account("0x0000000000000000000000000000000000000000")
            .unwrap_err();
        assert!(matches!(err, Error::Verification { .. }));
    }

    #[test]
    fn test_verify_requires_prefix() {
        let (public, _) = pair();
        let bare = public.address().to_hex();
        assert!(matches!(
            public.verify_account(&bare),
            Err(Error::Verification { .. })
        ));
    }

    #[test]
    fn test_encrypt_with_check() {
        let (public, private) = pair();
        let account = public.address().to_checksum();

        let ciphertext = public.encrypt_with_check(&account, "checked").unwrap();
        assert_eq!(
            private.decrypt_with_check(&account, &ciphertext).unwrap(),
            "checked"
        );
    }

    #[test]
    fn test_with_check_propagates_verification_error() {
        let (public, private) = pair();
        let wrong = Verifier::import_private_key(SECRET_ONE)
            .unwrap()
            .address()
            .to_checksum();

        assert!(matches!(
            public.encrypt_with_check(&wrong, "x"),
            Err(Error::Verification { .. })
        ));

        let ciphertext = public.encrypt("x").unwrap();
        assert!(matches!(
            private.decrypt_with_check(&wrong, &ciphertext),
            Err(Error::Verification { .. })
        ));
    }

    #[test]
    fn test_decrypt_needs_private_key() {
        let (public, _) = pair();
        let ciphertext = public.encrypt("x").unwrap();

        assert!(!public.has_private_key());
        assert!(matches!(
            public.decrypt(&ciphertext),
            Err(Error::MissingKey("private key"))
        ));
        assert!(matches!(
            public.decrypt_with_check(&public.address().to_checksum(), &ciphertext),
            Err(Error::MissingKey(_))
        ));
        assert!(matches!(
            public.decrypt_base64("AAAA"),
            Err(Error::MissingKey(_))
        ));
    }

    #[test]
    fn test_decrypt_with_wrong_key() {
        let (public, _) = pair();
        let (_, other_private) = pair();
        let ciphertext = public.encrypt("x").unwrap();
        assert!(matches!(
            other_private.decrypt(&ciphertext),
            Err(Error::Decrypt(_))
        ));
    }

    #[test]
    fn test_decrypt_corrupted_ciphertext() {
        let (public, private) = pair();
        let mut envelope = hex::decode(public.encrypt("payload").unwrap()).unwrap();
        envelope[100] ^= 0xff;
        assert!(matches!(
            private.decrypt(&hex::encode(envelope)),
            Err(Error::Decrypt(_))
        ));
    }

    #[test]
    fn test_decrypt_non_utf8_plaintext() {
        let (public, private) = pair();
        let envelope = ecies::encrypt(public.public_key(), &[0xff, 0xfe, 0xfd]).unwrap();
        assert!(matches!(
            private.decrypt(&hex::encode(envelope)),
            Err(Error::Decrypt(_))
        ));
    }

    #[test_case("zz"; "non hex characters")]
    #[test_case("abc"; "odd length")]
    #[test_case("0x0g"; "prefixed non hex")]
    fn test_import_public_key_decode_error(input: &str) {
        assert!(matches!(
            Verifier::import_public_key(input),
            Err(Error::Decode(_))
        ));
    }

    #[test_case("zz"; "non hex characters")]
    #[test_case("123"; "odd length")]
    fn test_import_private_key_decode_error(input: &str) {
        assert!(matches!(
            Verifier::import_private_key(input),
            Err(Error::Decode(_))
        ));
    }

    #[test_case(""; "empty")]
    #[test_case("04"; "lone prefix byte")]
    #[test_case("02ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"; "x beyond field")]
    #[test_case("0500000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000"; "bad format byte")]
    fn test_import_public_key_parse_error(input: &str) {
        assert!(matches!(
            Verifier::import_public_key(input),
            Err(Error::KeyParse(_))
        ));
    }

    #[test_case(""; "empty")]
    #[test_case("01"; "too short")]
    #[test_case("0000000000000000000000000000000000000000000000000000000000000000"; "zero")]
    #[test_case("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"; "curve order")]
    #[test_case("ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"; "above curve order")]
    #[test_case("000000000000000000000000000000000000000000000000000000000000000001"; "thirty three bytes")]
    fn test_import_private_key_parse_error(input: &str) {
        assert!(matches!(
            Verifier::import_private_key(input),
            Err(Error::KeyParse(_))
        ));
    }

    #[test_case("zz"; "non hex characters")]
    #[test_case("abc"; "odd length")]
    fn test_decrypt_decode_error(input: &str) {
        let (_, private) = pair();
        assert!(matches!(private.decrypt(input), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decrypt_base64_decode_error() {
        let (_, private) = pair();
        assert!(matches!(
            private.decrypt_base64("not base64!"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_short_ciphertext() {
        let (_, private) = pair();
        assert!(matches!(private.decrypt("00"), Err(Error::Decrypt(_))));
        assert!(matches!(private.decrypt(""), Err(Error::Decrypt(_))));
    }

    #[test]
    fn test_shared_across_threads() {
        let (public, private) = pair();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let public = public.clone();
                let private = private.clone();
                std::thread::spawn(move || {
                    let message = format!("message {}", i);
                    let ciphertext = public.encrypt(&message).unwrap();
                    assert_eq!(private.decrypt(&ciphertext).unwrap(), message);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
