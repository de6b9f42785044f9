//! # ECDSA Signature Value
//!
//! The (r, s) pair with a strict DER codec and explicit low-S
//! normalization. Normalization is never applied implicitly: verification
//! accepts the raw form, and callers that require canonical signatures ask
//! for it.

use crate::errors::CryptoError;
use k256::elliptic_curve::scalar::IsHigh;
use k256::NonZeroScalar;

/// An ECDSA signature over the secp256k1 group.
///
/// Both components are scalars in [1, n-1]; construction rejects anything
/// else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdsaSignature {
    inner: k256::ecdsa::Signature,
}

impl EcdsaSignature {
    /// Build from 32-byte big-endian r and s.
    pub fn from_scalars(r: &[u8; 32], s: &[u8; 32]) -> Result<Self, CryptoError> {
        k256::ecdsa::Signature::from_scalars(*r, *s)
            .map(|inner| Self { inner })
            .map_err(|_| CryptoError::InvalidSignatureEncoding)
    }

    /// Strict DER decode: a SEQUENCE of two minimally-encoded INTEGERs,
    /// nothing trailing.
    pub fn from_der(bytes: &[u8]) -> Result<Self, CryptoError> {
        k256::ecdsa::Signature::from_der(bytes)
            .map(|inner| Self { inner })
            .map_err(|_| CryptoError::InvalidSignatureEncoding)
    }

    /// DER encoding.
    pub fn to_der(&self) -> Vec<u8> {
        self.inner.to_der().as_bytes().to_vec()
    }

    /// Big-endian r.
    pub fn r_bytes(&self) -> [u8; 32] {
        let (r, _) = self.inner.split_scalars();
        r.to_bytes().into()
    }

    /// Big-endian s.
    pub fn s_bytes(&self) -> [u8; 32] {
        let (_, s) = self.inner.split_scalars();
        s.to_bytes().into()
    }

    /// True when s > n/2 (the malleable twin of the canonical form).
    pub fn is_high_s(&self) -> bool {
        let (_, s) = self.inner.split_scalars();
        bool::from(s.is_high())
    }

    /// The canonical low-S form: s > n/2 becomes n - s, otherwise identity.
    pub fn normalize_s(self) -> Self {
        match self.inner.normalize_s() {
            Some(inner) => Self { inner },
            None => self,
        }
    }

    pub(crate) fn split_scalars(&self) -> (NonZeroScalar, NonZeroScalar) {
        self.inner.split_scalars()
    }

    pub(crate) fn from_raw(inner: k256::ecdsa::Signature) -> Self {
        Self { inner }
    }
}
