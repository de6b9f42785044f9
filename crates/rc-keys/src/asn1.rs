//! # ASN.1 Private-Key Codec
//!
//! The OpenSSL `EC_PRIVATEKEY` structure:
//!
//! ```text
//! SEQUENCE {
//!     INTEGER 1,
//!     OCTET STRING private (32 bytes),
//!     [0] EXPLICIT OBJECT IDENTIFIER 1.3.132.0.10 (secp256k1),
//!     [1] EXPLICIT BIT STRING public (SEC1)
//! }
//! ```
//!
//! Decoding is strict: exactly four elements, version 1, the named curve,
//! a canonical public prefix, and no trailing bytes. Signature DER lives
//! with the signature value; this module only handles the key structure.

use crate::errors::KeyError;
use zeroize::Zeroizing;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_CONTEXT_0: u8 = 0xA0;
const TAG_CONTEXT_1: u8 = 0xA1;

/// DER TLV of OBJECT IDENTIFIER 1.3.132.0.10 (secp256k1).
const SECP256K1_OID: [u8; 7] = [0x06, 0x05, 0x2B, 0x81, 0x04, 0x00, 0x0A];

/// A decoded `EC_PRIVATEKEY`: the private scalar and the embedded public
/// bytes, unvalidated against each other (the key layer cross-checks).
#[derive(Debug)]
pub struct DecodedEcPrivateKey {
    /// 32 big-endian private bytes, zeroed on drop.
    pub private: Zeroizing<[u8; 32]>,
    /// SEC1 public bytes as embedded in the bit string.
    pub public: Vec<u8>,
}

/// Encode a private/public pair as `EC_PRIVATEKEY`.
pub fn encode_ec_private_key(private: &[u8; 32], public: &[u8]) -> Vec<u8> {
    let mut bit_string = Vec::with_capacity(public.len() + 1);
    bit_string.push(0x00); // no unused bits
    bit_string.extend_from_slice(public);

    let mut body = Vec::new();
    write_tlv(&mut body, TAG_INTEGER, &[0x01]);
    write_tlv(&mut body, TAG_OCTET_STRING, private);
    write_tlv(&mut body, TAG_CONTEXT_0, &SECP256K1_OID);
    let mut wrapped = Vec::new();
    write_tlv(&mut wrapped, TAG_BIT_STRING, &bit_string);
    write_tlv(&mut body, TAG_CONTEXT_1, &wrapped);

    let mut out = Vec::new();
    write_tlv(&mut out, TAG_SEQUENCE, &body);
    out
}

/// Decode an `EC_PRIVATEKEY`, strictly.
pub fn decode_ec_private_key(bytes: &[u8]) -> Result<DecodedEcPrivateKey, KeyError> {
    let mut outer = Reader::new(bytes);
    let mut seq = outer.read_tlv(TAG_SEQUENCE)?;
    if !outer.is_empty() {
        return Err(KeyError::InvalidAsn1("trailing bytes after sequence"));
    }

    let version = seq.read_tlv(TAG_INTEGER)?;
    if version.remaining() != [0x01] {
        return Err(KeyError::InvalidAsn1("unsupported version"));
    }

    let octets = seq.read_tlv(TAG_OCTET_STRING)?;
    if octets.remaining().len() != 32 {
        return Err(KeyError::InvalidAsn1("private part must be 32 bytes"));
    }
    let mut private = Zeroizing::new([0u8; 32]);
    private.copy_from_slice(octets.remaining());

    let params = seq.read_tlv(TAG_CONTEXT_0)?;
    if params.remaining() != SECP256K1_OID {
        return Err(KeyError::InvalidAsn1("unexpected curve parameters"));
    }

    let mut wrapper = seq.read_tlv(TAG_CONTEXT_1)?;
    let bit_string = wrapper.read_tlv(TAG_BIT_STRING)?;
    if !wrapper.is_empty() {
        return Err(KeyError::InvalidAsn1("trailing bytes in public element"));
    }
    let bits = bit_string.remaining();
    let (&unused, public) = bits
        .split_first()
        .ok_or(KeyError::InvalidAsn1("empty bit string"))?;
    if unused != 0 {
        return Err(KeyError::InvalidAsn1("bit string has unused bits"));
    }
    if !rc_crypto::point::is_canonical_encoding(public) {
        return Err(KeyError::InvalidAsn1("public part is not canonical SEC1"));
    }

    if !seq.is_empty() {
        return Err(KeyError::InvalidAsn1("sequence must hold exactly four elements"));
    }

    Ok(DecodedEcPrivateKey {
        private,
        public: public.to_vec(),
    })
}

fn write_tlv(out: &mut Vec<u8>, tag: u8, value: &[u8]) {
    out.push(tag);
    write_len(out, value.len());
    out.extend_from_slice(value);
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], KeyError> {
        if self.data.len() - self.pos < n {
            return Err(KeyError::InvalidAsn1("truncated"));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_tlv(&mut self, expected_tag: u8) -> Result<Reader<'a>, KeyError> {
        let tag = self.take(1)?[0];
        if tag != expected_tag {
            return Err(KeyError::InvalidAsn1("unexpected tag"));
        }
        let len = self.read_len()?;
        Ok(Reader::new(self.take(len)?))
    }

    fn read_len(&mut self) -> Result<usize, KeyError> {
        let first = self.take(1)?[0];
        if first < 0x80 {
            return Ok(first as usize);
        }
        let count = (first & 0x7F) as usize;
        if count == 0 || count > 2 {
            return Err(KeyError::InvalidAsn1("unsupported length form"));
        }
        let mut len = 0usize;
        for &byte in self.take(count)? {
            len = (len << 8) | byte as usize;
        }
        if len < 0x80 {
            return Err(KeyError::InvalidAsn1("non-minimal length"));
        }
        Ok(len)
    }
}
