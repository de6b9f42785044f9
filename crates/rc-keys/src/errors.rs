//! # Key Errors
//!
//! One variant per failure class, so callers can tell "the user mistyped
//! their passphrase" apart from "this blob is corrupt".

use rc_crypto::CryptoError;
use thiserror::Error;

/// Errors from keypair operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Malformed bytes at the primitive layer (SEC1, DER, scalar range)
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The ASN.1 private-key structure is malformed
    #[error("invalid ASN.1 key encoding: {0}")]
    InvalidAsn1(&'static str),

    /// The signed-message wire form is malformed (base64, length, header)
    #[error("invalid message signature: {0}")]
    InvalidMessageSignature(&'static str),

    /// Operation requires a private key but this key is public-only
    #[error("key has no private part")]
    MissingPrivateKey,

    /// Operation requires the cleartext private key but it is encrypted
    #[error("private key is encrypted; supply the AES key")]
    KeyIsEncrypted,

    /// The crypter offered for decryption is not the one that encrypted
    #[error("crypter does not match the one used for encryption")]
    CrypterMismatch,

    /// Decryption ran but produced a key whose public part disagrees
    #[error("decryption produced the wrong key (bad AES key)")]
    WrongAesKey,

    /// No public-key candidate exists for the signature
    #[error("public-key recovery impossible")]
    RecoveryImpossible,

    /// The signature parsed but does not match this key and message
    #[error("signature does not match")]
    SignatureMismatch,

    /// The underlying cipher or KDF reported a failure
    #[error("crypter failure: {0}")]
    CrypterFailure(String),

    /// Internal inconsistency that valid inputs cannot produce
    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
}
