//! # cadenza-crypto
//!
//! Cryptographic primitives used by the execution engine.
//!
//! - Keccak-256, SHA-256 and RIPEMD-160 hashing
//! - secp256k1 signing and public key recovery
//! - Address derivation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod signature;

pub use error::CryptoError;
pub use hash::{keccak256, ripemd160, sha256};
pub use signature::{
    public_key_to_address, recover_address, recover_public_key, sign, PrivateKey, PublicKey,
    Signature,
};
