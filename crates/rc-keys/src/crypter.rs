//! # At-Rest Key Encryption
//!
//! Pluggable symmetric providers for private-key material. The key core
//! only ever encrypts the 32-byte private scalar; the public point stays in
//! cleartext so encrypted keys remain watch-capable.
//!
//! The default provider pairs an scrypt KDF with AES-256-CBC, the scheme
//! wallet files in this ecosystem use.

use crate::errors::KeyError;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

/// Bytes of an AES-256 key.
pub const AES_KEY_LEN: usize = 32;
/// Bytes of a CBC initialisation vector.
pub const IV_LEN: usize = 16;
/// Bytes of the KDF salt persisted with a wallet.
pub const SALT_LEN: usize = 8;

/// An AES-256 key, usually derived from a passphrase. Zeroed on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct AesKey([u8; AES_KEY_LEN]);

impl AesKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; AES_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; AES_KEY_LEN] {
        &self.0
    }
}

/// Tag persisted alongside encrypted blobs so decoders can select the
/// matching crypter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionType {
    /// Cleartext
    Unencrypted,
    /// scrypt KDF + AES-256-CBC
    ScryptAes,
}

/// Ciphertext plus IV, opaque to the key core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPrivateKey {
    /// CBC initialisation vector
    pub iv: Vec<u8>,
    /// Padded ciphertext
    pub ciphertext: Vec<u8>,
}

/// Symmetric provider contract for private-key material at rest.
pub trait KeyCrypter: Send + Sync {
    /// The scheme this crypter implements.
    fn encryption_type(&self) -> EncryptionType;

    /// Stretch a passphrase into an AES key. Deliberately slow; callers
    /// cache the result.
    fn derive_key(&self, passphrase: &str) -> Result<AesKey, KeyError>;

    /// Encrypt plaintext under a derived key.
    fn encrypt(&self, plaintext: &[u8], key: &AesKey) -> Result<EncryptedPrivateKey, KeyError>;

    /// Reverse [`encrypt`](Self::encrypt).
    fn decrypt(
        &self,
        encrypted: &EncryptedPrivateKey,
        key: &AesKey,
    ) -> Result<Zeroizing<Vec<u8>>, KeyError>;
}

/// Capability set the wallet layer consumes from anything it can encrypt.
pub trait EncryptableItem {
    /// Cleartext secret, when available. Zeroed on drop.
    fn secret_bytes(&self) -> Option<Zeroizing<Vec<u8>>>;

    /// Encrypted form, when present.
    fn encrypted_data(&self) -> Option<&EncryptedPrivateKey>;

    /// The scheme protecting this item.
    fn encryption_type(&self) -> EncryptionType;
}

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// scrypt (N = 16384, r = 8, p = 1) + AES-256-CBC with PKCS7 padding.
pub struct ScryptAesCrypter {
    salt: [u8; SALT_LEN],
    params: scrypt::Params,
}

impl ScryptAesCrypter {
    /// The wallet-interoperable cost parameters: N = 2^14, r = 8, p = 1.
    pub const DEFAULT_LOG_N: u8 = 14;

    /// Fresh crypter with a random salt and the default cost.
    pub fn new() -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::with_salt(salt)
    }

    /// Rebuild a crypter from a persisted salt.
    pub fn with_salt(salt: [u8; SALT_LEN]) -> Self {
        // fixed parameters; construction cannot fail
        let params = scrypt::Params::new(Self::DEFAULT_LOG_N, 8, 1, AES_KEY_LEN)
            .expect("default scrypt parameters are valid");
        Self { salt, params }
    }

    /// Crypter with caller-chosen cost parameters (tests use cheap ones).
    pub fn with_params(salt: [u8; SALT_LEN], params: scrypt::Params) -> Self {
        Self { salt, params }
    }

    /// The KDF salt, persisted next to the wallet.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }
}

impl Default for ScryptAesCrypter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyCrypter for ScryptAesCrypter {
    fn encryption_type(&self) -> EncryptionType {
        EncryptionType::ScryptAes
    }

    fn derive_key(&self, passphrase: &str) -> Result<AesKey, KeyError> {
        let mut out = [0u8; AES_KEY_LEN];
        scrypt::scrypt(passphrase.as_bytes(), &self.salt, &self.params, &mut out)
            .map_err(|e| KeyError::CrypterFailure(e.to_string()))?;
        let key = AesKey::from_bytes(out);
        out.zeroize();
        Ok(key)
    }

    fn encrypt(&self, plaintext: &[u8], key: &AesKey) -> Result<EncryptedPrivateKey, KeyError> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
            .map_err(|e| KeyError::CrypterFailure(e.to_string()))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        Ok(EncryptedPrivateKey {
            iv: iv.to_vec(),
            ciphertext,
        })
    }

    fn decrypt(
        &self,
        encrypted: &EncryptedPrivateKey,
        key: &AesKey,
    ) -> Result<Zeroizing<Vec<u8>>, KeyError> {
        let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), &encrypted.iv)
            .map_err(|e| KeyError::CrypterFailure(e.to_string()))?;
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&encrypted.ciphertext)
            .map_err(|e| KeyError::CrypterFailure(e.to_string()))?;
        Ok(Zeroizing::new(plaintext))
    }
}
