//! Crypto error types.

use thiserror::Error;

/// Errors from the curve, signature and recovery primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Public-key bytes are not a canonical SEC1 encoding (bad prefix byte
    /// or length; hybrid and infinity forms are rejected)
    #[error("invalid SEC1 point encoding")]
    InvalidPointEncoding,

    /// The encoding is well-formed but the coordinates are not on the curve
    #[error("point is not on the secp256k1 curve")]
    NotOnCurve,

    /// Private scalar outside [2, n-1]; zero and one are reserved
    #[error("invalid private scalar")]
    InvalidPrivateScalar,

    /// Signature bytes are not strict DER, or carry out-of-range scalars
    #[error("invalid signature encoding")]
    InvalidSignatureEncoding,

    /// The deterministic signer rejected the digest
    #[error("signing failed")]
    SigningFailed,
}
