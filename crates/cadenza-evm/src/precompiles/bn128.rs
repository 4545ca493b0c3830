//! alt_bn128 curve operations (EIP-196, EIP-197) at Istanbul prices

use super::{charge, right_pad, PrecompileError, PrecompileOutput, PrecompileResult};
use bn::{AffineG1, AffineG2, Fq, Fq2, Fr, Group, Gt, G1, G2};

const ADD_COST: u64 = 150;
const MUL_COST: u64 = 6000;
const PAIRING_BASE_COST: u64 = 45_000;
const PAIRING_PAIR_COST: u64 = 34_000;

const FQ_LEN: usize = 32;
const G1_LEN: usize = 2 * FQ_LEN;
const G2_LEN: usize = 4 * FQ_LEN;
const PAIR_LEN: usize = G1_LEN + G2_LEN;

fn read_fq(bytes: &[u8]) -> Result<Fq, PrecompileError> {
    Fq::from_slice(&bytes[..FQ_LEN]).map_err(|_| PrecompileError::InvalidFieldElement)
}

/// Fq2 element encoded imaginary part first
fn read_fq2(bytes: &[u8]) -> Result<Fq2, PrecompileError> {
    let imaginary = read_fq(&bytes[..FQ_LEN])?;
    let real = read_fq(&bytes[FQ_LEN..])?;
    Ok(Fq2::new(real, imaginary))
}

/// G1 point; `(0, 0)` is the point at infinity
fn read_g1(bytes: &[u8]) -> Result<G1, PrecompileError> {
    let x = read_fq(&bytes[..FQ_LEN])?;
    let y = read_fq(&bytes[FQ_LEN..G1_LEN])?;
    if x == Fq::zero() && y == Fq::zero() {
        return Ok(G1::zero());
    }
    AffineG1::new(x, y)
        .map(Into::into)
        .map_err(|_| PrecompileError::NotOnCurve)
}

fn read_g2(bytes: &[u8]) -> Result<G2, PrecompileError> {
    let x = read_fq2(&bytes[..2 * FQ_LEN])?;
    let y = read_fq2(&bytes[2 * FQ_LEN..G2_LEN])?;
    if x.is_zero() && y.is_zero() {
        return Ok(G2::zero());
    }
    AffineG2::new(x, y)
        .map(Into::into)
        .map_err(|_| PrecompileError::NotOnCurve)
}

/// Affine big-endian coordinates; infinity encodes as all zeros
fn encode_g1(point: G1) -> Result<Vec<u8>, PrecompileError> {
    let mut out = vec![0u8; G1_LEN];
    if let Some(affine) = AffineG1::from_jacobian(point) {
        affine
            .x()
            .to_big_endian(&mut out[..FQ_LEN])
            .map_err(|_| PrecompileError::InvalidFieldElement)?;
        affine
            .y()
            .to_big_endian(&mut out[FQ_LEN..])
            .map_err(|_| PrecompileError::InvalidFieldElement)?;
    }
    Ok(out)
}

pub(super) fn add(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let gas_used = charge(ADD_COST, gas_limit)?;
    let input = right_pad::<{ 2 * G1_LEN }>(input);
    let sum = read_g1(&input[..G1_LEN])? + read_g1(&input[G1_LEN..])?;
    Ok(PrecompileOutput::new(gas_used, encode_g1(sum)?))
}

pub(super) fn mul(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let gas_used = charge(MUL_COST, gas_limit)?;
    let input = right_pad::<{ G1_LEN + 32 }>(input);
    let point = read_g1(&input[..G1_LEN])?;
    let scalar = Fr::from_slice(&input[G1_LEN..]).map_err(|_| PrecompileError::InvalidFieldElement)?;
    Ok(PrecompileOutput::new(gas_used, encode_g1(point * scalar)?))
}

pub(super) fn pairing(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let pairs = (input.len() / PAIR_LEN) as u64;
    let cost = PAIRING_PAIR_COST
        .saturating_mul(pairs)
        .saturating_add(PAIRING_BASE_COST);
    let gas_used = charge(cost, gas_limit)?;
    if input.len() % PAIR_LEN != 0 {
        return Err(PrecompileError::InvalidInputLength);
    }

    let mut points = Vec::with_capacity(pairs as usize);
    for chunk in input.chunks_exact(PAIR_LEN) {
        let g1 = read_g1(&chunk[..G1_LEN])?;
        let g2 = read_g2(&chunk[G1_LEN..])?;
        // a pair with infinity contributes the identity
        if !g1.is_zero() && !g2.is_zero() {
            points.push((g1, g2));
        }
    }

    let holds = points.is_empty() || bn::pairing_batch(&points) == Gt::one();
    let mut output = vec![0u8; 32];
    output[31] = holds as u8;
    Ok(PrecompileOutput::new(gas_used, output))
}
