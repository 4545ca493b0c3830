//! ECRECOVER, SHA256, RIPEMD160 and IDENTITY

use super::{charge, linear_cost, right_pad, PrecompileOutput, PrecompileResult};
use cadenza_crypto::{recover_address, Signature};
use cadenza_primitives::H256;

const ECRECOVER_COST: u64 = 3000;

pub(super) fn ecrecover(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let gas_used = charge(ECRECOVER_COST, gas_limit)?;
    let input = right_pad::<128>(input);

    // v is a full word that must hold exactly 27 or 28
    let v = input[63];
    if input[32..63].iter().any(|b| *b != 0) || !(v == 27 || v == 28) {
        return Ok(PrecompileOutput::new(gas_used, Vec::new()));
    }

    let mut hash = [0u8; 32];
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    hash.copy_from_slice(&input[..32]);
    r.copy_from_slice(&input[64..96]);
    s.copy_from_slice(&input[96..128]);

    let output = match recover_address(&H256::from_bytes(hash), &Signature::new(r, s, v)) {
        Ok(address) => {
            let mut word = vec![0u8; 32];
            word[12..].copy_from_slice(address.as_bytes());
            word
        }
        Err(_) => Vec::new(),
    };
    Ok(PrecompileOutput::new(gas_used, output))
}

pub(super) fn sha256(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let gas_used = charge(linear_cost(input.len(), 60, 12), gas_limit)?;
    Ok(PrecompileOutput::new(
        gas_used,
        cadenza_crypto::sha256(input).to_vec(),
    ))
}

pub(super) fn ripemd160(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let gas_used = charge(linear_cost(input.len(), 600, 120), gas_limit)?;
    let mut output = vec![0u8; 32];
    output[12..].copy_from_slice(&cadenza_crypto::ripemd160(input));
    Ok(PrecompileOutput::new(gas_used, output))
}

pub(super) fn identity(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let gas_used = charge(linear_cost(input.len(), 15, 3), gas_limit)?;
    Ok(PrecompileOutput::new(gas_used, input.to_vec()))
}
