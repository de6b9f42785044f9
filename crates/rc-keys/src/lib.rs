//! # rc-keys - Keypairs, Signed Messages, At-Rest Encryption
//!
//! The key-management layer of Rustcoin, built on the [`rc_crypto`]
//! primitives.
//!
//! ## Components
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | `key` | The immutable keypair value: factories, signing, addresses |
//! | `message` | Magic-prefixed text signing with recoverable signatures |
//! | `crypter` | Pluggable at-rest encryption of the private scalar |
//! | `asn1` | OpenSSL `EC_PRIVATEKEY` import/export |
//!
//! ## Security Properties
//!
//! - Private material zeroes on drop and never appears in `Display`/`Debug`
//! - Encrypted keys keep the public point cleartext and stay watch-capable
//! - Distinct error variants separate "wrong passphrase" from "corrupt blob"

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asn1;
pub mod crypter;
pub mod errors;
pub mod key;
pub mod message;

// Re-exports
pub use crypter::{
    AesKey, EncryptableItem, EncryptedPrivateKey, EncryptionType, KeyCrypter, ScryptAesCrypter,
};
pub use errors::KeyError;
pub use key::{cmp_by_creation_time, Key};
pub use message::{
    recover_signer, sign_message, signed_message_digest, verify_message,
    BITCOIN_SIGNED_MESSAGE_MAGIC,
};
