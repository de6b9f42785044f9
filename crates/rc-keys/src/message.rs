//! # Signed Text Messages
//!
//! Human-readable message signing compatible with the reference wallet's
//! `signmessage` format: the network magic and the UTF-8 text are each
//! varint-length-prefixed, double-SHA256 hashed, and signed; the wire form
//! is base64 of one header byte plus r and s.
//!
//! The header byte carries the recovery id and the compression flag, so a
//! verifier can reconstruct the exact public key (and therefore the
//! address) from the signature alone.

use crate::crypter::AesKey;
use crate::errors::KeyError;
use crate::key::Key;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rc_crypto::ecdsa;
use rc_crypto::hashing::sha256d;
use rc_crypto::EcdsaSignature;

/// Magic prefix of the main Bitcoin network. Other networks inject their
/// own string.
pub const BITCOIN_SIGNED_MESSAGE_MAGIC: &str = "Bitcoin Signed Message:\n";

/// Wire length: header byte plus 32-byte r plus 32-byte s.
pub const SIGNATURE_LEN: usize = 65;

const HEADER_BASE: u8 = 27;
const HEADER_COMPRESSED: u8 = 4;
const HEADER_MAX: u8 = 34;

/// The digest that actually gets signed: double SHA-256 of the
/// varint-framed magic and message.
pub fn signed_message_digest(magic: &str, message: &str) -> [u8; 32] {
    let mut payload = Vec::with_capacity(magic.len() + message.len() + 18);
    write_varint(&mut payload, magic.len() as u64);
    payload.extend_from_slice(magic.as_bytes());
    write_varint(&mut payload, message.len() as u64);
    payload.extend_from_slice(message.as_bytes());
    sha256d(&payload)
}

/// Serialize `n` in the wire varint format.
fn write_varint(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xFC => out.push(n as u8),
        0xFD..=0xFFFF => {
            out.push(0xFD);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xFFFF_FFFF => {
            out.push(0xFE);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xFF);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Sign a text message, returning the base64 wire form.
///
/// The recovery id is found by trial: each candidate is recovered and
/// compared against the signing key. A well-formed key always matches one;
/// exhausting the search is an internal invariant failure.
pub fn sign_message(
    key: &Key,
    message: &str,
    magic: &str,
    aes_key: Option<&AesKey>,
) -> Result<String, KeyError> {
    let digest = signed_message_digest(magic, message);
    let signature = key.sign_digest(&digest, aes_key)?;
    let compressed = key.is_compressed();

    let mut rec_id = None;
    for candidate in 0..4u8 {
        if let Some(recovered) = ecdsa::recover_public_key(candidate, &signature, &digest, compressed)
        {
            if recovered.encoded() == key.pub_bytes() {
                rec_id = Some(candidate);
                break;
            }
        }
    }
    let rec_id = rec_id.ok_or(KeyError::Invariant("no recovery id reproduces this key"))?;

    let mut wire = [0u8; SIGNATURE_LEN];
    wire[0] = HEADER_BASE + rec_id + if compressed { HEADER_COMPRESSED } else { 0 };
    wire[1..33].copy_from_slice(&signature.r_bytes());
    wire[33..65].copy_from_slice(&signature.s_bytes());
    Ok(BASE64.encode(wire))
}

/// Recover the signer of a message as a watch-only key.
pub fn recover_signer(message: &str, signature_b64: &str, magic: &str) -> Result<Key, KeyError> {
    let wire = BASE64
        .decode(signature_b64)
        .map_err(|_| KeyError::InvalidMessageSignature("not base64"))?;
    if wire.len() != SIGNATURE_LEN {
        return Err(KeyError::InvalidMessageSignature("must decode to 65 bytes"));
    }

    let mut header = wire[0];
    if !(HEADER_BASE..=HEADER_MAX).contains(&header) {
        return Err(KeyError::InvalidMessageSignature("header byte out of range"));
    }
    let compressed = header >= HEADER_BASE + HEADER_COMPRESSED;
    if compressed {
        header -= HEADER_COMPRESSED;
    }
    let rec_id = header - HEADER_BASE;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&wire[1..33]);
    s.copy_from_slice(&wire[33..65]);
    let signature = EcdsaSignature::from_scalars(&r, &s)?;

    let digest = signed_message_digest(magic, message);
    let public = ecdsa::recover_public_key(rec_id, &signature, &digest, compressed)
        .ok_or(KeyError::RecoveryImpossible)?;
    Ok(Key::from_public_point(public))
}

/// Succeeds iff `signature_b64` signs `message` for `key`.
pub fn verify_message(
    key: &Key,
    message: &str,
    signature_b64: &str,
    magic: &str,
) -> Result<(), KeyError> {
    let signer = recover_signer(message, signature_b64, magic)?;
    if signer.pub_bytes() == key.pub_bytes() {
        Ok(())
    } else {
        Err(KeyError::SignatureMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_key(seed: u64) -> Key {
        Key::new_random_with(&mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_varint_framing() {
        let mut out = Vec::new();
        write_varint(&mut out, 0);
        write_varint(&mut out, 0xFC);
        write_varint(&mut out, 0xFD);
        write_varint(&mut out, 0xFFFF);
        write_varint(&mut out, 0x1_0000);
        assert_eq!(
            out,
            vec![
                0x00, // 0
                0xFC, // 252, the last single-byte value
                0xFD, 0xFD, 0x00, // 253 as marker + u16le
                0xFD, 0xFF, 0xFF, // 65535
                0xFE, 0x00, 0x00, 0x01, 0x00, // 65536 as marker + u32le
            ]
        );
    }

    #[test]
    fn test_digest_depends_on_magic_and_message() {
        let base = signed_message_digest(BITCOIN_SIGNED_MESSAGE_MAGIC, "hello");
        assert_ne!(base, signed_message_digest(BITCOIN_SIGNED_MESSAGE_MAGIC, "hello!"));
        assert_ne!(base, signed_message_digest("Testnet Signed Message:\n", "hello"));
    }

    #[test]
    fn test_sign_recover_roundtrip() {
        let key = seeded_key(21);
        let encoded = key
            .sign_message("hello", None)
            .unwrap();

        // 65 bytes of base64 is 88 characters
        assert_eq!(encoded.len(), 88);

        let signer =
            recover_signer("hello", &encoded, BITCOIN_SIGNED_MESSAGE_MAGIC).unwrap();
        assert_eq!(signer.pub_bytes(), key.pub_bytes());
        assert!(signer.is_watching());
        assert!(key.verify_message("hello", &encoded).is_ok());
    }

    #[test]
    fn test_compressed_flag_rides_the_header() {
        let compressed = seeded_key(22);
        let sig = compressed.sign_message("carry the flag", None).unwrap();
        let header = BASE64.decode(&sig).unwrap()[0];
        assert!((31..=34).contains(&header));

        let uncompressed = compressed.decompress().unwrap();
        let sig = uncompressed.sign_message("carry the flag", None).unwrap();
        let header = BASE64.decode(&sig).unwrap()[0];
        assert!((27..=30).contains(&header));

        let signer = recover_signer(
            "carry the flag",
            &sig,
            BITCOIN_SIGNED_MESSAGE_MAGIC,
        )
        .unwrap();
        assert!(!signer.is_compressed());
        assert_eq!(signer.pub_bytes(), uncompressed.pub_bytes());
    }

    #[test]
    fn test_wrong_message_is_a_mismatch() {
        let key = seeded_key(23);
        let sig = key.sign_message("the real message", None).unwrap();
        assert_eq!(
            key.verify_message("a forged message", &sig),
            Err(KeyError::SignatureMismatch)
        );
    }

    #[test]
    fn test_wrong_key_is_a_mismatch() {
        let signer = seeded_key(24);
        let other = seeded_key(25);
        let sig = signer.sign_message("message", None).unwrap();
        assert_eq!(
            other.verify_message("message", &sig),
            Err(KeyError::SignatureMismatch)
        );
    }

    #[test]
    fn test_tampering_fails_to_verify() {
        let key = seeded_key(26);
        let sig = key.sign_message("hello", None).unwrap();

        // flip a character in the r/s region
        let mut tampered: Vec<char> = sig.chars().collect();
        tampered[40] = if tampered[40] == 'A' { 'B' } else { 'A' };
        let tampered: String = tampered.into_iter().collect();

        assert!(key.verify_message("hello", &tampered).is_err());
    }

    #[test]
    fn test_malformed_wire_forms_are_bad_input() {
        let key = seeded_key(27);

        assert!(matches!(
            key.verify_message("m", "@@@not-base64@@@"),
            Err(KeyError::InvalidMessageSignature(_))
        ));

        let short = BASE64.encode([0u8; 64]);
        assert!(matches!(
            key.verify_message("m", &short),
            Err(KeyError::InvalidMessageSignature(_))
        ));

        // header byte below 27
        let mut wire = [1u8; SIGNATURE_LEN];
        wire[0] = 26;
        assert!(matches!(
            key.verify_message("m", &BASE64.encode(wire)),
            Err(KeyError::InvalidMessageSignature(_))
        ));

        // header byte above 34
        wire[0] = 35;
        assert!(matches!(
            key.verify_message("m", &BASE64.encode(wire)),
            Err(KeyError::InvalidMessageSignature(_))
        ));
    }

    #[test]
    fn test_encrypted_key_signs_messages_with_aes_key() {
        use crate::crypter::test_support::cheap_crypter;
        use crate::crypter::KeyCrypter;
        use std::sync::Arc;

        let crypter: Arc<dyn KeyCrypter> = Arc::new(cheap_crypter());
        let aes_key = crypter.derive_key("passphrase").unwrap();
        let key = seeded_key(28);
        let encrypted = key.encrypt(crypter, &aes_key).unwrap();

        assert_eq!(
            encrypted.sign_message("locked", None).unwrap_err(),
            KeyError::KeyIsEncrypted
        );
        let sig = encrypted.sign_message("locked", Some(&aes_key)).unwrap();
        assert!(key.verify_message("locked", &sig).is_ok());
    }
}
