//! # ECDSA Engine
//!
//! Deterministic signing of 32-byte digests, plus verification and
//! public-key recovery over secp256k1.
//!
//! ## Security Properties
//!
//! - Nonces per RFC 6979: signing needs no entropy and cannot reuse k
//! - Verification accepts the raw (r, s) form; low-S is a separate,
//!   explicit operation on the signature value
//! - Recovery covers all four candidate ids, including the rare
//!   r-overflow pair {2, 3}

use crate::context::FIELD_PRIME;
use crate::errors::CryptoError;
use crate::point::PublicPoint;
use crate::signature::EcdsaSignature;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::bigint::{ArrayEncoding, CheckedAdd};
use k256::elliptic_curve::ops::{Invert, LinearCombination, Reduce};
use k256::elliptic_curve::point::{AffineCoordinates, DecompressPoint};
use k256::elliptic_curve::subtle::Choice;
use k256::elliptic_curve::Curve;
use k256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar, Secp256k1, SecretKey, U256};

/// Parse a 32-byte big-endian private scalar.
///
/// Rejects zero, one (sentinel values some importers use for "missing"),
/// and anything not below the group order.
pub fn private_scalar_from_bytes(bytes: &[u8; 32]) -> Result<SecretKey, CryptoError> {
    let secret =
        SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateScalar)?;
    if *secret.to_nonzero_scalar() == Scalar::ONE {
        return Err(CryptoError::InvalidPrivateScalar);
    }
    Ok(secret)
}

/// Sign a 32-byte digest with an RFC 6979 deterministic nonce.
///
/// The k-derivation loop inside the signer already regenerates on the
/// (astronomically rare) r = 0 or s = 0 outcomes. The result is emitted in
/// low-S form.
pub fn sign_digest(secret: &SecretKey, digest: &[u8; 32]) -> Result<EcdsaSignature, CryptoError> {
    let signing_key = SigningKey::from(secret);
    let (signature, _) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|_| CryptoError::SigningFailed)?;
    Ok(EcdsaSignature::from_raw(signature))
}

/// Verify a signature over a 32-byte digest (SEC1 v2, section 4.1.4).
///
/// Computes w = s^-1, u1 = zw, u2 = rw and accepts iff u1*G + u2*Q is a
/// finite point whose x-coordinate is congruent to r mod n. High-S
/// signatures verify; canonicalization is the caller's policy.
pub fn verify_digest(public: &PublicPoint, digest: &[u8; 32], signature: &EcdsaSignature) -> bool {
    let Ok(q) = public.point() else {
        return false;
    };

    let z = scalar_from_digest(digest);
    let (r, s) = signature.split_scalars();
    let s_inv = *s.invert();
    let u1 = z * s_inv;
    let u2 = *r * s_inv;

    let x = ProjectivePoint::lincomb(
        &ProjectivePoint::GENERATOR,
        &u1,
        &ProjectivePoint::from(q),
        &u2,
    )
    .to_affine();
    if x == AffinePoint::IDENTITY {
        return false;
    }
    *r == <Scalar as Reduce<U256>>::reduce_bytes(&x.x())
}

/// Recover the signer's public point from a signature (SEC1 v2, section
/// 4.1.6).
///
/// `rec_id` packs two bits: bit 0 is the parity of R.y, bit 1 whether r
/// overflowed the group order. Returns `None` when no public key exists
/// for the candidate (recovery impossible).
pub fn recover_public_key(
    rec_id: u8,
    signature: &EcdsaSignature,
    digest: &[u8; 32],
    compressed: bool,
) -> Option<PublicPoint> {
    if rec_id > 3 {
        return None;
    }
    let (r, s) = signature.split_scalars();

    // Candidate x = r + (rec_id / 2) * n, which must stay below the field
    // prime to name a coordinate at all.
    let x_bytes: FieldBytes = if rec_id >= 2 {
        let candidate = Option::<U256>::from(
            U256::from_be_byte_array(r.to_bytes()).checked_add(&Secp256k1::ORDER),
        )?;
        if candidate >= U256::from_be_byte_array(FIELD_PRIME.into()) {
            return None;
        }
        candidate.to_be_byte_array()
    } else {
        r.to_bytes()
    };

    let y_is_odd = Choice::from(rec_id & 1);
    let r_point = Option::<AffinePoint>::from(AffinePoint::decompress(&x_bytes, y_is_odd))?;
    // n * R = infinity holds for every curve point here: secp256k1 has
    // cofactor 1, so the group order is prime.

    // Q = r^-1 * (s*R - z*G)
    let z = scalar_from_digest(digest);
    let r_inv = *r.invert();
    let u1 = -(r_inv * z);
    let u2 = r_inv * *s;
    let q = ProjectivePoint::lincomb(
        &ProjectivePoint::GENERATOR,
        &u1,
        &ProjectivePoint::from(r_point),
        &u2,
    )
    .to_affine();
    if q == AffinePoint::IDENTITY {
        return None;
    }
    Some(PublicPoint::from_affine(q, compressed))
}

/// Interpret a digest as a scalar, reduced mod n.
fn scalar_from_digest(digest: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*digest))
}
