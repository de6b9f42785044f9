//! # Points and SEC1 Encoding
//!
//! Strict codec for public points plus the lazily-decoded wrapper the key
//! layer stores. The encoding is the identity: derived addresses hash the
//! bytes, so the compression flag is preserved everywhere.

use crate::errors::CryptoError;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{AffinePoint, EncodedPoint};
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Length of a compressed SEC1 encoding (0x02/0x03 prefix).
pub const COMPRESSED_LEN: usize = 33;
/// Length of an uncompressed SEC1 encoding (0x04 prefix).
pub const UNCOMPRESSED_LEN: usize = 65;

/// Whether `bytes` are a canonical SEC1 point encoding.
///
/// Canonical means 33 bytes starting 0x02/0x03 or 65 bytes starting 0x04.
/// The hybrid (0x06/0x07) and infinity (0x00) forms are not canonical.
pub fn is_canonical_encoding(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(0x02) | Some(0x03) => bytes.len() == COMPRESSED_LEN,
        Some(0x04) => bytes.len() == UNCOMPRESSED_LEN,
        _ => false,
    }
}

/// Decode canonical SEC1 bytes into an affine point.
pub fn decode_point(bytes: &[u8]) -> Result<AffinePoint, CryptoError> {
    if !is_canonical_encoding(bytes) {
        return Err(CryptoError::InvalidPointEncoding);
    }
    let encoded =
        EncodedPoint::from_bytes(bytes).map_err(|_| CryptoError::InvalidPointEncoding)?;
    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(CryptoError::NotOnCurve)
}

/// Encode an affine point with the given compression flag.
///
/// The point must not be the identity, which has no SEC1 coordinate form.
pub fn encode_point(point: &AffinePoint, compressed: bool) -> Vec<u8> {
    point.to_encoded_point(compressed).as_bytes().to_vec()
}

/// A public point together with its compression flag, decoded on demand.
///
/// Stores the canonical encoding and defers the expensive y-coordinate
/// decompression until a caller actually needs the affine point. The cache
/// is initialized once and is safe to read from any thread.
///
/// Two wrappers are equal iff their encodings are byte-identical; the
/// canonical codec makes that the same as comparing (x, y, flag).
#[derive(Debug, Clone)]
pub struct PublicPoint {
    encoded: Box<[u8]>,
    decoded: OnceLock<Option<AffinePoint>>,
}

impl PublicPoint {
    /// Wrap canonical SEC1 bytes.
    ///
    /// Prefix and length are checked here; curve membership is only checked
    /// on first [`point`](Self::point) access.
    pub fn from_sec1(bytes: &[u8]) -> Result<Self, CryptoError> {
        if !is_canonical_encoding(bytes) {
            return Err(CryptoError::InvalidPointEncoding);
        }
        Ok(Self {
            encoded: bytes.into(),
            decoded: OnceLock::new(),
        })
    }

    /// Wrap an already-decoded point, choosing its encoding.
    pub fn from_affine(point: AffinePoint, compressed: bool) -> Self {
        let this = Self {
            encoded: encode_point(&point, compressed).into_boxed_slice(),
            decoded: OnceLock::new(),
        };
        let _ = this.decoded.set(Some(point));
        this
    }

    /// The canonical SEC1 encoding.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// True for the 33-byte form.
    pub fn is_compressed(&self) -> bool {
        self.encoded.len() == COMPRESSED_LEN
    }

    /// The affine point, decompressing and caching on first use.
    pub fn point(&self) -> Result<AffinePoint, CryptoError> {
        (*self.decoded.get_or_init(|| decode_point(&self.encoded).ok()))
            .ok_or(CryptoError::NotOnCurve)
    }

    /// The same point with the compressed encoding.
    pub fn to_compressed(&self) -> Result<Self, CryptoError> {
        self.with_compression(true)
    }

    /// The same point with the uncompressed encoding.
    pub fn to_uncompressed(&self) -> Result<Self, CryptoError> {
        self.with_compression(false)
    }

    fn with_compression(&self, compressed: bool) -> Result<Self, CryptoError> {
        if compressed == self.is_compressed() {
            return Ok(self.clone());
        }
        Ok(Self::from_affine(self.point()?, compressed))
    }
}

impl PartialEq for PublicPoint {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for PublicPoint {}

impl Hash for PublicPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}
