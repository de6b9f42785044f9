//! # Keypair Value
//!
//! The immutable secp256k1 keypair record: an optional private scalar, a
//! lazily-decoded public point, a creation time, and an optional
//! encrypted private blob with the crypter that produced it.
//!
//! A key can be signing-capable (cleartext private part), encrypted
//! (private part recoverable with an AES key), or watch-only (public part
//! only). Encryption never mutates a key; it produces a new one.

use crate::crypter::{AesKey, EncryptableItem, EncryptedPrivateKey, EncryptionType, KeyCrypter};
use crate::errors::KeyError;
use crate::{asn1, message};
use rc_crypto::hashing::hash160;
use rc_crypto::point::PublicPoint;
use rc_crypto::{ecdsa, EcdsaSignature, Scalar, SecretKey};
use rand::{CryptoRng, RngCore};
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::{Zeroize, Zeroizing};

/// Bytes of the version-prefixed address payload.
pub const ADDRESS_PAYLOAD_LEN: usize = 21;

/// A secp256k1 keypair.
///
/// Immutable once constructed, except for the creation time (set by the
/// owning wallet) and the populate-on-first-use public-key-hash cache.
/// Shareable across threads.
#[derive(Clone)]
pub struct Key {
    secret: Option<SecretKey>,
    public: PublicPoint,
    creation_time_secs: u64,
    crypter: Option<Arc<dyn KeyCrypter>>,
    encrypted_secret: Option<EncryptedPrivateKey>,
    pub_key_hash: OnceLock<[u8; 20]>,
}

impl Key {
    fn assemble(secret: Option<SecretKey>, public: PublicPoint, creation_time_secs: u64) -> Self {
        Self {
            secret,
            public,
            creation_time_secs,
            crypter: None,
            encrypted_secret: None,
            pub_key_hash: OnceLock::new(),
        }
    }

    // ------------------------------------------------------------------
    // Factories
    // ------------------------------------------------------------------

    /// Generate a fresh compressed keypair from the process CSPRNG,
    /// stamped with the current time.
    pub fn new_random() -> Self {
        Self::new_random_with(&mut rc_crypto::context::secure_rng())
    }

    /// Generate with a caller-supplied RNG (tests inject a seeded one).
    pub fn new_random_with(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        loop {
            let secret = SecretKey::random(rng);
            let d = *secret.to_nonzero_scalar();
            // 1 and n-1 collide with sentinel values wallet importers use;
            // resample on the astronomically rare hit
            if d == Scalar::ONE || d == -Scalar::ONE {
                continue;
            }
            let public = PublicPoint::from_affine(*secret.public_key().as_affine(), true);
            return Self::assemble(Some(secret), public, now_secs());
        }
    }

    /// Keypair from a private scalar; Q = d*G with the requested flag.
    pub fn from_private(secret: SecretKey, compressed: bool) -> Result<Self, KeyError> {
        if *secret.to_nonzero_scalar() == Scalar::ONE {
            return Err(rc_crypto::CryptoError::InvalidPrivateScalar.into());
        }
        let public = PublicPoint::from_affine(*secret.public_key().as_affine(), compressed);
        Ok(Self::assemble(Some(secret), public, 0))
    }

    /// Keypair from 32 big-endian private bytes.
    pub fn from_private_bytes(bytes: &[u8; 32], compressed: bool) -> Result<Self, KeyError> {
        let secret = ecdsa::private_scalar_from_bytes(bytes)?;
        Self::from_private(secret, compressed)
    }

    /// Keypair from both halves. The caller asserts Q = d*G; the point's
    /// compression flag is preserved as given.
    pub fn from_private_and_public(
        secret: SecretKey,
        public: PublicPoint,
    ) -> Result<Self, KeyError> {
        if *secret.to_nonzero_scalar() == Scalar::ONE {
            return Err(rc_crypto::CryptoError::InvalidPrivateScalar.into());
        }
        Ok(Self::assemble(Some(secret), public, 0))
    }

    /// Watch-only keypair around a public point.
    pub fn from_public_point(public: PublicPoint) -> Self {
        Self::assemble(None, public, 0)
    }

    /// Watch-only keypair from SEC1 bytes.
    pub fn from_public_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        Ok(Self::from_public_point(PublicPoint::from_sec1(bytes)?))
    }

    /// Keypair whose private part sits encrypted in `blob`; signing is
    /// disabled until an AES key is supplied.
    pub fn from_encrypted(
        blob: EncryptedPrivateKey,
        crypter: Arc<dyn KeyCrypter>,
        pub_bytes: &[u8],
    ) -> Result<Self, KeyError> {
        let public = PublicPoint::from_sec1(pub_bytes)?;
        Ok(Self {
            secret: None,
            public,
            creation_time_secs: 0,
            crypter: Some(crypter),
            encrypted_secret: Some(blob),
            pub_key_hash: OnceLock::new(),
        })
    }

    /// Keypair from an OpenSSL `EC_PRIVATEKEY` structure, validating that
    /// the embedded public key matches d*G.
    pub fn from_asn1(bytes: &[u8]) -> Result<Self, KeyError> {
        let decoded = asn1::decode_ec_private_key(bytes)?;
        let secret = ecdsa::private_scalar_from_bytes(&decoded.private)?;
        let compressed = decoded.public.len() == rc_crypto::point::COMPRESSED_LEN;
        let derived = PublicPoint::from_affine(*secret.public_key().as_affine(), compressed);
        if derived.encoded() != &decoded.public[..] {
            return Err(KeyError::InvalidAsn1("public key does not match the private scalar"));
        }
        Ok(Self::assemble(Some(secret), derived, 0))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Canonical SEC1 public bytes, compression flag preserved.
    pub fn pub_bytes(&self) -> &[u8] {
        self.public.encoded()
    }

    /// The public point wrapper.
    pub fn public_point(&self) -> &PublicPoint {
        &self.public
    }

    /// Hex form of the public bytes.
    pub fn pub_hex(&self) -> String {
        hex::encode(self.public.encoded())
    }

    /// RIPEMD-160(SHA-256(pub_bytes)), computed once and cached.
    pub fn pub_hash(&self) -> [u8; 20] {
        *self
            .pub_key_hash
            .get_or_init(|| hash160(self.public.encoded()))
    }

    /// 32 big-endian private bytes.
    ///
    /// Fails with [`KeyError::KeyIsEncrypted`] when the private part is
    /// present but encrypted, and [`KeyError::MissingPrivateKey`] on a
    /// watch-only key.
    pub fn priv_bytes(&self) -> Result<[u8; 32], KeyError> {
        match &self.secret {
            Some(secret) => Ok(secret.to_bytes().into()),
            None if self.is_encrypted() => Err(KeyError::KeyIsEncrypted),
            None => Err(KeyError::MissingPrivateKey),
        }
    }

    /// True for the 33-byte public encoding.
    pub fn is_compressed(&self) -> bool {
        self.public.is_compressed()
    }

    /// True when no cleartext private part is held.
    pub fn is_pub_only(&self) -> bool {
        self.secret.is_none()
    }

    /// True when a crypter and a non-empty encrypted blob are present.
    pub fn is_encrypted(&self) -> bool {
        self.crypter.is_some()
            && self
                .encrypted_secret
                .as_ref()
                .is_some_and(|blob| !blob.ciphertext.is_empty())
    }

    /// True for a key that can only ever watch: public-only and not
    /// encrypted.
    pub fn is_watching(&self) -> bool {
        self.is_pub_only() && !self.is_encrypted()
    }

    /// True when the private part is known in any form.
    pub fn has_priv_key(&self) -> bool {
        self.secret.is_some() || self.is_encrypted()
    }

    /// Seconds since the epoch when this key was created; zero means
    /// unknown.
    pub fn creation_time_secs(&self) -> u64 {
        self.creation_time_secs
    }

    /// Record the creation time. Owner-only; shared keys stay immutable.
    pub fn set_creation_time_secs(&mut self, secs: u64) {
        self.creation_time_secs = secs;
    }

    /// A copy of this key with the uncompressed public encoding.
    pub fn decompress(&self) -> Result<Self, KeyError> {
        if !self.is_compressed() {
            return Ok(self.clone());
        }
        let mut copy = self.clone();
        copy.public = self.public.to_uncompressed()?;
        copy.pub_key_hash = OnceLock::new();
        Ok(copy)
    }

    /// Version-prefixed pubkey-hash payload for a downstream Base58Check
    /// encoder.
    pub fn to_address(&self, version: u8) -> [u8; ADDRESS_PAYLOAD_LEN] {
        let mut payload = [0u8; ADDRESS_PAYLOAD_LEN];
        payload[0] = version;
        payload[1..].copy_from_slice(&self.pub_hash());
        payload
    }

    /// Encode as an OpenSSL `EC_PRIVATEKEY` structure.
    pub fn to_asn1(&self) -> Result<Vec<u8>, KeyError> {
        let priv_bytes = Zeroizing::new(self.priv_bytes()?);
        Ok(asn1::encode_ec_private_key(&priv_bytes, self.pub_bytes()))
    }

    // ------------------------------------------------------------------
    // Signing and verification
    // ------------------------------------------------------------------

    /// Sign a 32-byte digest.
    ///
    /// An encrypted key needs `aes_key`; it is decrypted transiently, the
    /// cleartext copy discarded as soon as the signature exists.
    pub fn sign_digest(
        &self,
        digest: &[u8; 32],
        aes_key: Option<&AesKey>,
    ) -> Result<EcdsaSignature, KeyError> {
        if self.is_encrypted() {
            let aes_key = aes_key.ok_or(KeyError::KeyIsEncrypted)?;
            let decrypted = self.decrypt(None, aes_key)?;
            let secret = decrypted
                .secret
                .as_ref()
                .ok_or(KeyError::Invariant("decrypt produced no private part"))?;
            return Ok(ecdsa::sign_digest(secret, digest)?);
        }
        let secret = self.secret.as_ref().ok_or(KeyError::MissingPrivateKey)?;
        Ok(ecdsa::sign_digest(secret, digest)?)
    }

    /// True iff `signature` signs `digest` for this key.
    pub fn verify_digest(&self, digest: &[u8; 32], signature: &EcdsaSignature) -> bool {
        ecdsa::verify_digest(&self.public, digest, signature)
    }

    /// Decode DER bytes and verify them against `digest`.
    pub fn verify_der(&self, digest: &[u8; 32], der: &[u8]) -> Result<bool, KeyError> {
        let signature = EcdsaSignature::from_der(der)?;
        Ok(self.verify_digest(digest, &signature))
    }

    /// Like [`verify_digest`](Self::verify_digest) but surfaces a distinct
    /// mismatch error.
    pub fn verify_digest_or_fail(
        &self,
        digest: &[u8; 32],
        signature: &EcdsaSignature,
    ) -> Result<(), KeyError> {
        if self.verify_digest(digest, signature) {
            Ok(())
        } else {
            Err(KeyError::SignatureMismatch)
        }
    }

    /// Like [`verify_der`](Self::verify_der) but surfaces a distinct
    /// mismatch error.
    pub fn verify_der_or_fail(&self, digest: &[u8; 32], der: &[u8]) -> Result<(), KeyError> {
        let signature = EcdsaSignature::from_der(der)?;
        self.verify_digest_or_fail(digest, &signature)
    }

    /// Sign a text message with the Bitcoin magic; see [`message`].
    pub fn sign_message(
        &self,
        text: &str,
        aes_key: Option<&AesKey>,
    ) -> Result<String, KeyError> {
        message::sign_message(self, text, message::BITCOIN_SIGNED_MESSAGE_MAGIC, aes_key)
    }

    /// Verify a base64 message signature made with the Bitcoin magic.
    pub fn verify_message(&self, text: &str, signature_b64: &str) -> Result<(), KeyError> {
        message::verify_message(self, text, signature_b64, message::BITCOIN_SIGNED_MESSAGE_MAGIC)
    }

    // ------------------------------------------------------------------
    // At-rest encryption
    // ------------------------------------------------------------------

    /// A new key whose private part is encrypted under `aes_key`; the
    /// cleartext scalar is absent from the result. Creation time carries
    /// over.
    pub fn encrypt(
        &self,
        crypter: Arc<dyn KeyCrypter>,
        aes_key: &AesKey,
    ) -> Result<Self, KeyError> {
        let mut priv_bytes = self.priv_bytes()?;
        let encrypted = crypter.encrypt(&priv_bytes, aes_key);
        priv_bytes.zeroize();
        Ok(Self {
            secret: None,
            public: self.public.clone(),
            creation_time_secs: self.creation_time_secs,
            crypter: Some(crypter),
            encrypted_secret: Some(encrypted?),
            pub_key_hash: self.pub_key_hash.clone(),
        })
    }

    /// A new key holding the cleartext private part.
    ///
    /// `crypter`, when supplied, must match the one that encrypted this
    /// key. A wrong AES key surfaces as [`KeyError::WrongAesKey`] (the
    /// decrypted scalar no longer derives this key's public point) or as a
    /// crypter failure.
    pub fn decrypt(
        &self,
        crypter: Option<&Arc<dyn KeyCrypter>>,
        aes_key: &AesKey,
    ) -> Result<Self, KeyError> {
        let (own_crypter, blob) = match (&self.crypter, &self.encrypted_secret) {
            (Some(crypter), Some(blob)) if !blob.ciphertext.is_empty() => (crypter, blob),
            _ => return Err(KeyError::Invariant("decrypt called on an unencrypted key")),
        };
        if let Some(supplied) = crypter {
            if supplied.encryption_type() != own_crypter.encryption_type() {
                return Err(KeyError::CrypterMismatch);
            }
        }
        let crypter = crypter.unwrap_or(own_crypter);

        let plaintext = crypter.decrypt(blob, aes_key)?;
        if plaintext.len() != 32 {
            return Err(KeyError::WrongAesKey);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&plaintext);
        let secret =
            ecdsa::private_scalar_from_bytes(&bytes).map_err(|_| KeyError::WrongAesKey);
        bytes.zeroize();
        let secret = secret?;

        let rebuilt =
            PublicPoint::from_affine(*secret.public_key().as_affine(), self.is_compressed());
        if rebuilt.encoded() != self.public.encoded() {
            return Err(KeyError::WrongAesKey);
        }

        Ok(Self {
            secret: Some(secret),
            public: self.public.clone(),
            creation_time_secs: self.creation_time_secs,
            crypter: None,
            encrypted_secret: None,
            pub_key_hash: self.pub_key_hash.clone(),
        })
    }

    /// Decrypt when both encrypted and given a key; identity otherwise.
    pub fn maybe_decrypt(&self, aes_key: Option<&AesKey>) -> Result<Self, KeyError> {
        match aes_key {
            Some(key) if self.is_encrypted() => self.decrypt(None, key),
            _ => Ok(self.clone()),
        }
    }

    /// Confirm, before committing a wallet encryption, that `encrypted`
    /// decrypts back into `original`.
    pub fn encryption_is_reversible(
        original: &Key,
        encrypted: &Key,
        crypter: &Arc<dyn KeyCrypter>,
        aes_key: &AesKey,
    ) -> bool {
        let original_bytes = match original.priv_bytes() {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(_) => return false,
        };
        match encrypted.decrypt(Some(crypter), aes_key) {
            Ok(rebuilt) => match rebuilt.priv_bytes() {
                Ok(bytes) => Zeroizing::new(bytes) == original_bytes,
                Err(_) => false,
            },
            Err(err) => {
                tracing::warn!(key = %original, error = %err, "encryption reversibility check failed");
                false
            }
        }
    }
}

/// Total order by creation time, oldest first; equal times tie-break by
/// lexicographic public bytes.
pub fn cmp_by_creation_time(a: &Key, b: &Key) -> Ordering {
    a.creation_time_secs
        .cmp(&b.creation_time_secs)
        .then_with(|| a.pub_bytes().cmp(b.pub_bytes()))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

impl EncryptableItem for Key {
    fn secret_bytes(&self) -> Option<Zeroizing<Vec<u8>>> {
        self.secret
            .as_ref()
            .map(|secret| Zeroizing::new(secret.to_bytes().to_vec()))
    }

    fn encrypted_data(&self) -> Option<&EncryptedPrivateKey> {
        self.encrypted_secret.as_ref()
    }

    fn encryption_type(&self) -> EncryptionType {
        self.crypter
            .as_ref()
            .map(|crypter| crypter.encryption_type())
            .unwrap_or(EncryptionType::Unencrypted)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        let secrets_equal = match (&self.secret, &other.secret) {
            (Some(a), Some(b)) => a.to_bytes() == b.to_bytes(),
            (None, None) => true,
            _ => false,
        };
        secrets_equal
            && self.public == other.public
            && self.creation_time_secs == other.creation_time_secs
            && self.encrypted_secret == other.encrypted_secret
            && self.crypter.as_ref().map(|c| c.encryption_type())
                == other.crypter.as_ref().map(|c| c.encryption_type())
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.pub_bytes().hash(state);
    }
}

// Never shows private material.
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pub:{}", self.pub_hex())?;
        if self.is_encrypted() {
            write!(f, " encrypted")?;
        } else if self.is_watching() {
            write!(f, " watch-only")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("pub", &self.pub_hex())
            .field("compressed", &self.is_compressed())
            .field("encrypted", &self.is_encrypted())
            .field("creation_time_secs", &self.creation_time_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypter::test_support::cheap_crypter;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rc_crypto::hashing::sha256;

    fn seeded_key(seed: u64) -> Key {
        Key::new_random_with(&mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_rejects_sentinel_private_scalars() {
        let zero = [0u8; 32];
        let mut one = [0u8; 32];
        one[31] = 1;
        assert!(Key::from_private_bytes(&zero, true).is_err());
        assert!(Key::from_private_bytes(&one, true).is_err());
    }

    #[test]
    fn test_two_derives_the_double_of_g() {
        let mut two = [0u8; 32];
        two[31] = 2;
        let key = Key::from_private_bytes(&two, true).unwrap();
        assert_eq!(
            key.pub_hex(),
            "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"
        );
    }

    #[test]
    fn test_public_roundtrip_preserves_bytes_and_hash() {
        let key = seeded_key(1);
        let serialized = key.pub_bytes().to_vec();
        assert_eq!(serialized.len(), 33);

        let restored = Key::from_public_bytes(&serialized).unwrap();
        assert_eq!(restored.pub_bytes(), &serialized[..]);
        assert_eq!(restored.pub_hash(), key.pub_hash());
        assert_eq!(restored.pub_hash(), hash160(&serialized));
        assert!(restored.is_watching());
    }

    #[test]
    fn test_sign_and_verify() {
        let key = seeded_key(2);
        let digest = sha256(b"digest under test");
        let signature = key.sign_digest(&digest, None).unwrap();
        assert!(key.verify_digest(&digest, &signature));
        assert!(key.verify_digest_or_fail(&digest, &signature).is_ok());
        assert!(key.verify_der(&digest, &signature.to_der()).unwrap());
    }

    #[test]
    fn test_verify_or_fail_reports_mismatch() {
        let signer = seeded_key(3);
        let other = seeded_key(4);
        let digest = sha256(b"digest");
        let signature = signer.sign_digest(&digest, None).unwrap();
        assert_eq!(
            other.verify_digest_or_fail(&digest, &signature),
            Err(KeyError::SignatureMismatch)
        );
    }

    #[test]
    fn test_watch_only_cannot_sign() {
        let key = seeded_key(5);
        let watch = Key::from_public_bytes(key.pub_bytes()).unwrap();
        let digest = sha256(b"digest");
        assert_eq!(
            watch.sign_digest(&digest, None).unwrap_err(),
            KeyError::MissingPrivateKey
        );
        assert_eq!(watch.priv_bytes().unwrap_err(), KeyError::MissingPrivateKey);
    }

    #[test]
    fn test_decompress_changes_encoding_not_the_point() {
        let key = seeded_key(6);
        assert!(key.is_compressed());

        let decompressed = key.decompress().unwrap();
        assert!(!decompressed.is_compressed());
        assert_eq!(decompressed.pub_bytes().len(), 65);
        assert_eq!(
            decompressed.public_point().point().unwrap(),
            key.public_point().point().unwrap()
        );
        // the address identity changes with the encoding
        assert_ne!(decompressed.pub_hash(), key.pub_hash());
        // the private part survives
        assert_eq!(decompressed.priv_bytes().unwrap(), key.priv_bytes().unwrap());
    }

    #[test]
    fn test_from_private_and_public_preserves_compression() {
        let key = seeded_key(7);
        let uncompressed_point = key.public_point().to_uncompressed().unwrap();
        let secret = ecdsa::private_scalar_from_bytes(&key.priv_bytes().unwrap()).unwrap();
        let rebuilt = Key::from_private_and_public(secret, uncompressed_point).unwrap();
        assert!(!rebuilt.is_compressed());
        assert_eq!(
            rebuilt.public_point().point().unwrap(),
            key.public_point().point().unwrap()
        );
    }

    #[test]
    fn test_to_address_prefixes_version() {
        let key = seeded_key(8);
        let payload = key.to_address(0x6F);
        assert_eq!(payload[0], 0x6F);
        assert_eq!(&payload[1..], &key.pub_hash()[..]);
    }

    #[test]
    fn test_equality_covers_creation_time() {
        let key = seeded_key(9);
        let mut later = key.clone();
        assert_eq!(later, key);
        later.set_creation_time_secs(key.creation_time_secs() + 1);
        assert_ne!(later, key);
    }

    #[test]
    fn test_age_order_ties_break_on_pub_bytes() {
        let mut a = seeded_key(10);
        let mut b = seeded_key(11);
        a.set_creation_time_secs(100);
        b.set_creation_time_secs(200);
        assert_eq!(cmp_by_creation_time(&a, &b), Ordering::Less);

        b.set_creation_time_secs(100);
        assert_eq!(
            cmp_by_creation_time(&a, &b),
            a.pub_bytes().cmp(b.pub_bytes())
        );
        assert_eq!(cmp_by_creation_time(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_encrypt_then_decrypt_restores_the_scalar() {
        let crypter: Arc<dyn KeyCrypter> = Arc::new(cheap_crypter());
        let aes_key = crypter.derive_key("passphrase").unwrap();
        let key = seeded_key(12);

        let encrypted = key.encrypt(crypter.clone(), &aes_key).unwrap();
        assert!(encrypted.is_encrypted());
        assert!(encrypted.is_pub_only());
        assert!(!encrypted.is_watching());
        assert!(encrypted.has_priv_key());
        assert_eq!(encrypted.priv_bytes().unwrap_err(), KeyError::KeyIsEncrypted);
        assert_eq!(encrypted.creation_time_secs(), key.creation_time_secs());

        let decrypted = encrypted.decrypt(Some(&crypter), &aes_key).unwrap();
        assert!(!decrypted.is_encrypted());
        assert_eq!(decrypted.priv_bytes().unwrap(), key.priv_bytes().unwrap());
        assert_eq!(decrypted.pub_bytes(), key.pub_bytes());
    }

    #[test]
    fn test_decrypt_with_wrong_aes_key_fails() {
        let crypter: Arc<dyn KeyCrypter> = Arc::new(cheap_crypter());
        let good = crypter.derive_key("right").unwrap();
        let bad = crypter.derive_key("wrong").unwrap();
        let key = seeded_key(13);

        let encrypted = key.encrypt(crypter.clone(), &good).unwrap();
        match encrypted.decrypt(Some(&crypter), &bad) {
            Err(KeyError::WrongAesKey) | Err(KeyError::CrypterFailure(_)) => {}
            other => panic!("expected a wrong-key failure, got {other:?}"),
        }
    }

    #[test]
    fn test_encrypted_key_signs_transiently() {
        let crypter: Arc<dyn KeyCrypter> = Arc::new(cheap_crypter());
        let aes_key = crypter.derive_key("passphrase").unwrap();
        let key = seeded_key(14);
        let digest = sha256(b"sign while encrypted");

        let encrypted = key.encrypt(crypter, &aes_key).unwrap();
        assert_eq!(
            encrypted.sign_digest(&digest, None).unwrap_err(),
            KeyError::KeyIsEncrypted
        );

        let signature = encrypted.sign_digest(&digest, Some(&aes_key)).unwrap();
        assert!(key.verify_digest(&digest, &signature));
        // still encrypted afterwards
        assert!(encrypted.is_encrypted());
    }

    #[test]
    fn test_maybe_decrypt_is_identity_when_not_applicable() {
        let key = seeded_key(15);
        assert_eq!(key.maybe_decrypt(None).unwrap(), key);

        let crypter: Arc<dyn KeyCrypter> = Arc::new(cheap_crypter());
        let aes_key = crypter.derive_key("passphrase").unwrap();
        assert_eq!(key.maybe_decrypt(Some(&aes_key)).unwrap(), key);

        let encrypted = key.encrypt(crypter, &aes_key).unwrap();
        let decrypted = encrypted.maybe_decrypt(Some(&aes_key)).unwrap();
        assert_eq!(decrypted.priv_bytes().unwrap(), key.priv_bytes().unwrap());
    }

    #[test]
    fn test_encryption_reversibility_check() {
        let crypter: Arc<dyn KeyCrypter> = Arc::new(cheap_crypter());
        let good = crypter.derive_key("right").unwrap();
        let bad = crypter.derive_key("wrong").unwrap();
        let key = seeded_key(16);

        let encrypted = key.encrypt(crypter.clone(), &good).unwrap();
        assert!(Key::encryption_is_reversible(&key, &encrypted, &crypter, &good));
        assert!(!Key::encryption_is_reversible(&key, &encrypted, &crypter, &bad));
    }

    #[test]
    fn test_encryptable_item_capabilities() {
        let crypter: Arc<dyn KeyCrypter> = Arc::new(cheap_crypter());
        let aes_key = crypter.derive_key("passphrase").unwrap();
        let key = seeded_key(17);

        assert_eq!(key.encryption_type(), EncryptionType::Unencrypted);
        assert!(key.secret_bytes().is_some());
        assert!(key.encrypted_data().is_none());

        let encrypted = key.encrypt(crypter, &aes_key).unwrap();
        assert_eq!(encrypted.encryption_type(), EncryptionType::ScryptAes);
        assert!(encrypted.secret_bytes().is_none());
        assert!(encrypted.encrypted_data().is_some());
    }

    #[test]
    fn test_from_asn1_validates_the_embedded_public_key() {
        let key = seeded_key(19);
        let other = seeded_key(20);

        let forged =
            asn1::encode_ec_private_key(&key.priv_bytes().unwrap(), other.pub_bytes());
        assert_eq!(
            Key::from_asn1(&forged).unwrap_err(),
            KeyError::InvalidAsn1("public key does not match the private scalar")
        );

        let restored = Key::from_asn1(&key.to_asn1().unwrap()).unwrap();
        assert_eq!(restored.pub_bytes(), key.pub_bytes());
        assert_eq!(restored.priv_bytes().unwrap(), key.priv_bytes().unwrap());
        assert!(restored.is_compressed());
    }

    #[test]
    fn test_display_and_debug_never_leak_private_bytes() {
        let key = seeded_key(18);
        let priv_hex = hex::encode(key.priv_bytes().unwrap());
        for rendered in [format!("{key}"), format!("{key:?}")] {
            assert!(rendered.contains(&key.pub_hex()));
            assert!(!rendered.contains(&priv_hex));
        }
    }

    #[test]
    fn test_random_keys_are_distinct_and_stamped() {
        let a = Key::new_random();
        let b = Key::new_random();
        assert_ne!(a.pub_bytes(), b.pub_bytes());
        assert!(a.creation_time_secs() > 0);
        assert!(a.is_compressed());
    }
}
