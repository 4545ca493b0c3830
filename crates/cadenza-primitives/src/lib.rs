//! # cadenza-primitives
//!
//! Primitive types shared by the Cadenza execution engine.
//!
//! The EVM works on 256-bit words ([`U256`]); addresses and hashes are
//! fixed-size byte newtypes that convert to and from words.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;
#[cfg(feature = "serde")]
mod serde_impl;

pub use address::Address;
pub use error::PrimitiveError;
pub use hash::H256;

// Re-export primitive-types for the word type
pub use primitive_types::{U256, U512};

/// Gas type
pub type Gas = u64;

/// Block number type
pub type BlockNumber = u64;

/// Transaction nonce type
pub type Nonce = u64;

/// Convert a boolean into the EVM word `0` or `1`
#[inline]
pub fn bool_to_word(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Convert a word to `usize`, returning `None` when it does not fit
#[inline]
pub fn word_to_usize(value: &U256) -> Option<usize> {
    if value.bits() > 64 {
        return None;
    }
    usize::try_from(value.low_u64()).ok()
}

/// Convert a word to `u64`, saturating at `u64::MAX`
#[inline]
pub fn word_to_u64_saturating(value: &U256) -> u64 {
    if value.bits() > 64 {
        u64::MAX
    } else {
        value.low_u64()
    }
}
