//! Precompiled contracts
//!
//! A precompile is a pure function of `(input, gas_limit)`. It never re-enters
//! the interpreter and never opens a checkpoint of its own: the calling frame's
//! checkpoint covers it. Any failure consumes the whole allotment.

mod blake2f;
mod bls12_381;
mod bn128;
mod kzg;
mod modexp;
mod simple;

use crate::error::ExceptionalHalt;
use crate::hardfork::Ruleset;
use bytes::Bytes;
use cadenza_primitives::Address;
use std::fmt;
use thiserror::Error;

/// Highest precompile address in use (BLS12-381 MAP_FP2_TO_G2)
pub const MAX_PRECOMPILE: u8 = 0x11;

/// Why a precompile rejected its input
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PrecompileError {
    /// Cost exceeds the gas given to the call
    #[error("out of gas")]
    OutOfGas,

    /// Input length not accepted by this precompile
    #[error("invalid input length")]
    InvalidInputLength,

    /// Coordinate not in the base field
    #[error("invalid field element")]
    InvalidFieldElement,

    /// Point is not on the curve
    #[error("point not on curve")]
    NotOnCurve,

    /// Point is not in the prime-order subgroup
    #[error("point not in subgroup")]
    NotInSubgroup,

    /// BLAKE2 final block flag other than 0 or 1
    #[error("invalid final block flag")]
    InvalidFinalFlag,

    /// KZG commitment does not match the versioned hash
    #[error("versioned hash mismatch")]
    VersionedHashMismatch,

    /// KZG proof does not verify
    #[error("invalid kzg proof")]
    InvalidProof,
}

impl PrecompileError {
    /// Short reason carried by the frame's exceptional halt
    pub fn reason(self) -> &'static str {
        match self {
            PrecompileError::OutOfGas => "out of gas",
            PrecompileError::InvalidInputLength => "invalid input length",
            PrecompileError::InvalidFieldElement => "invalid field element",
            PrecompileError::NotOnCurve => "point not on curve",
            PrecompileError::NotInSubgroup => "point not in subgroup",
            PrecompileError::InvalidFinalFlag => "invalid final block flag",
            PrecompileError::VersionedHashMismatch => "versioned hash mismatch",
            PrecompileError::InvalidProof => "invalid kzg proof",
        }
    }
}

impl From<PrecompileError> for ExceptionalHalt {
    fn from(err: PrecompileError) -> Self {
        match err {
            PrecompileError::OutOfGas => ExceptionalHalt::OutOfGas,
            other => ExceptionalHalt::PrecompileFailure(other.reason()),
        }
    }
}

/// Successful precompile run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecompileOutput {
    /// Gas charged
    pub gas_used: u64,
    /// Returned bytes
    pub output: Bytes,
}

impl PrecompileOutput {
    fn new(gas_used: u64, output: impl Into<Bytes>) -> Self {
        Self {
            gas_used,
            output: output.into(),
        }
    }
}

/// Result type for precompile runs
pub type PrecompileResult = Result<PrecompileOutput, PrecompileError>;

/// Precompile entry point
pub type Precompile = fn(&[u8], u64) -> PrecompileResult;

/// Charge `cost` against `gas_limit`
fn charge(cost: u64, gas_limit: u64) -> Result<u64, PrecompileError> {
    if cost > gas_limit {
        Err(PrecompileError::OutOfGas)
    } else {
        Ok(cost)
    }
}

/// `base + word * ceil(len / 32)`
fn linear_cost(len: usize, base: u64, word: u64) -> u64 {
    let words = (len as u64).div_ceil(32);
    base.saturating_add(words.saturating_mul(word))
}

/// First `N` bytes of `data`, zero-filled on the right when short
fn right_pad<const N: usize>(data: &[u8]) -> [u8; N] {
    let mut padded = [0u8; N];
    let len = data.len().min(N);
    padded[..len].copy_from_slice(&data[..len]);
    padded
}

/// Precompiles active under one rule set, indexed by the low address byte
#[derive(Clone)]
pub struct Precompiles {
    entries: [Option<Precompile>; MAX_PRECOMPILE as usize + 1],
}

impl Precompiles {
    /// Table for `rules`
    pub fn new(rules: &Ruleset) -> Self {
        let mut entries: [Option<Precompile>; MAX_PRECOMPILE as usize + 1] =
            [None; MAX_PRECOMPILE as usize + 1];
        entries[0x01] = Some(simple::ecrecover as Precompile);
        entries[0x02] = Some(simple::sha256);
        entries[0x03] = Some(simple::ripemd160);
        entries[0x04] = Some(simple::identity);
        entries[0x05] = Some(if rules.is_activated(2565) {
            modexp::berlin as Precompile
        } else {
            modexp::byzantium as Precompile
        });
        entries[0x06] = Some(bn128::add);
        entries[0x07] = Some(bn128::mul);
        entries[0x08] = Some(bn128::pairing);
        if rules.is_activated(152) {
            entries[0x09] = Some(blake2f::run);
        }
        if rules.is_activated(4844) {
            entries[0x0a] = Some(kzg::point_evaluation);
        }
        if rules.is_activated(2537) {
            entries[0x0b] = Some(bls12_381::g1_add);
            entries[0x0c] = Some(bls12_381::g1_msm);
            entries[0x0d] = Some(bls12_381::g2_add);
            entries[0x0e] = Some(bls12_381::g2_msm);
            entries[0x0f] = Some(bls12_381::pairing);
            entries[0x10] = Some(bls12_381::map_fp_to_g1);
            entries[0x11] = Some(bls12_381::map_fp2_to_g2);
        }
        Self { entries }
    }

    fn lookup(&self, address: &Address) -> Option<Precompile> {
        let bytes = address.as_bytes();
        if bytes[..19].iter().any(|b| *b != 0) {
            return None;
        }
        self.entries.get(bytes[19] as usize).copied().flatten()
    }

    /// Whether `address` is an active precompile
    pub fn contains(&self, address: &Address) -> bool {
        self.lookup(address).is_some()
    }

    /// Active precompile addresses, ascending
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .map(|(index, _)| Address::from_low_byte(index as u8))
    }

    /// Number of active precompiles
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether no precompile is active
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the precompile at `address`; `None` if there is none
    pub fn run(&self, address: &Address, input: &[u8], gas_limit: u64) -> Option<PrecompileResult> {
        self.lookup(address).map(|precompile| precompile(input, gas_limit))
    }
}

impl fmt::Debug for Precompiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Precompiles")
            .field("active", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardfork::Hardfork;

    #[test]
    fn test_table_follows_forks() {
        let cancun = Precompiles::new(&Ruleset::new(Hardfork::Cancun));
        assert_eq!(cancun.len(), 10);
        assert!(cancun.contains(&Address::from_low_byte(0x0a)));
        assert!(!cancun.contains(&Address::from_low_byte(0x0b)));

        let istanbul = Precompiles::new(&Ruleset::new(Hardfork::Istanbul));
        assert_eq!(istanbul.len(), 9);

        let prague = Precompiles::new(&Ruleset::new(Hardfork::Prague));
        assert_eq!(prague.len(), 17);
        assert_eq!(prague.addresses().last(), Some(Address::from_low_byte(0x11)));
    }

    #[test]
    fn test_lookup_rejects_other_addresses() {
        let table = Precompiles::new(&Ruleset::new(Hardfork::Prague));
        assert!(!table.contains(&Address::ZERO));
        assert!(!table.contains(&Address::from_low_byte(0x12)));
        let mut bytes = [0u8; 20];
        bytes[0] = 1;
        bytes[19] = 1;
        assert!(!table.contains(&Address::from_bytes(bytes)));
        assert!(table.run(&Address::from_low_byte(0x12), &[], 100).is_none());
    }

    #[test]
    fn test_failure_maps_to_halt() {
        assert_eq!(ExceptionalHalt::from(PrecompileError::OutOfGas), ExceptionalHalt::OutOfGas);
        assert_eq!(
            ExceptionalHalt::from(PrecompileError::NotOnCurve),
            ExceptionalHalt::PrecompileFailure("point not on curve")
        );
    }

    #[test]
    fn test_linear_cost() {
        assert_eq!(linear_cost(0, 15, 3), 15);
        assert_eq!(linear_cost(1, 15, 3), 18);
        assert_eq!(linear_cost(33, 60, 12), 84);
    }
}
