//! # rc-crypto - secp256k1 Primitives
//!
//! The curve-level building blocks of Rustcoin.
//!
//! ## Components
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | `context` | Domain parameters and the process RNG handle |
//! | `point` | SEC1 point codec, compression, lazy decoding |
//! | `signature` | (r, s) value with DER codec and low-S normalization |
//! | `ecdsa` | Deterministic signing, verification, public-key recovery |
//! | `hashing` | SHA-256, double SHA-256, RIPEMD-160 over SHA-256 |
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Strict canonical encodings (a one-bit change is a different identity)
//! - Recovery per SEC1 v2 section 4.1.6, all four candidate ids

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod point;
pub mod signature;

// Re-exports
pub use errors::CryptoError;
pub use point::PublicPoint;
pub use signature::EcdsaSignature;

// The arithmetic surface is k256's; re-exported so downstream crates share
// one set of types.
pub use k256::{AffinePoint, ProjectivePoint, Scalar, SecretKey};
