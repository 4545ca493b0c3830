//! BLS12-381 curve operations (EIP-2537)
//!
//! Field elements travel as 64-byte big-endian words whose top 16 bytes must be
//! zero. G1 points are `x || y` (128 bytes), G2 points `x0 || x1 || y0 || y1`
//! (256 bytes) with `x = x0 + x1 * u`. All-zero encodes the point at infinity.

use super::{charge, PrecompileError, PrecompileOutput, PrecompileResult};
use ark_bls12_381::{g1, g2, Bls12_381, Fq, Fq2, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::hashing::curve_maps::wb::WBMap;
use ark_ec::hashing::map_to_curve_hasher::MapToCurve;
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInt, BigInteger, One, PrimeField, Zero};

const G1_ADD_COST: u64 = 375;
const G2_ADD_COST: u64 = 600;
const G1_MUL_COST: u64 = 12_000;
const G2_MUL_COST: u64 = 22_500;
const PAIRING_BASE_COST: u64 = 37_700;
const PAIRING_PAIR_COST: u64 = 32_600;
const MAP_FP_TO_G1_COST: u64 = 5_500;
const MAP_FP2_TO_G2_COST: u64 = 23_800;

const FP_LEN: usize = 64;
const G1_LEN: usize = 2 * FP_LEN;
const G2_LEN: usize = 4 * FP_LEN;
const SCALAR_LEN: usize = 32;
const G1_MSM_PAIR_LEN: usize = G1_LEN + SCALAR_LEN;
const G2_MSM_PAIR_LEN: usize = G2_LEN + SCALAR_LEN;
const PAIRING_PAIR_LEN: usize = G1_LEN + G2_LEN;

/// MSM discount is expressed in thousandths
const DISCOUNT_MULTIPLIER: u64 = 1000;

const G1_DISCOUNT: [u64; 128] = [
    1000, 949, 848, 797, 764, 750, 738, 728, 719, 712, 705, 698, 692, 687, 682, 677, 673, 669, 665,
    661, 658, 654, 651, 648, 645, 642, 640, 637, 635, 632, 630, 627, 625, 623, 621, 619, 617, 615,
    613, 611, 609, 608, 606, 604, 603, 601, 599, 598, 596, 595, 593, 592, 591, 589, 588, 586, 585,
    584, 582, 581, 580, 579, 577, 576, 575, 574, 573, 572, 570, 569, 568, 567, 566, 565, 564, 563,
    562, 561, 560, 559, 558, 557, 556, 555, 554, 553, 552, 551, 550, 549, 548, 547, 547, 546, 545,
    544, 543, 542, 541, 540, 540, 539, 538, 537, 536, 536, 535, 534, 533, 532, 532, 531, 530, 529,
    528, 528, 527, 526, 525, 525, 524, 523, 522, 522, 521, 520, 520, 519,
];

const G2_DISCOUNT: [u64; 128] = [
    1000, 1000, 923, 884, 855, 832, 812, 796, 782, 770, 759, 749, 740, 732, 724, 717, 711, 704,
    699, 693, 688, 683, 679, 674, 670, 666, 663, 659, 655, 652, 649, 646, 643, 640, 637, 634, 632,
    629, 627, 624, 622, 620, 618, 615, 613, 611, 609, 607, 606, 604, 602, 600, 598, 597, 595, 593,
    592, 590, 589, 587, 586, 584, 583, 582, 580, 579, 578, 576, 575, 574, 573, 571, 570, 569, 568,
    567, 566, 565, 563, 562, 561, 560, 559, 558, 557, 556, 555, 554, 553, 552, 552, 551, 550, 549,
    548, 547, 546, 545, 545, 544, 543, 542, 541, 541, 540, 539, 538, 537, 537, 536, 535, 535, 534,
    533, 532, 532, 531, 530, 530, 529, 528, 528, 527, 526, 526, 525, 524, 524,
];

fn msm_cost(pairs: usize, discount: &[u64; 128], mul_cost: u64) -> u64 {
    if pairs == 0 {
        return 0;
    }
    let discount = discount[pairs.min(discount.len()) - 1];
    (pairs as u64)
        .saturating_mul(mul_cost)
        .saturating_mul(discount)
        / DISCOUNT_MULTIPLIER
}

// ==================== Encoding ====================

fn read_fp(bytes: &[u8]) -> Result<Fq, PrecompileError> {
    if bytes[..16].iter().any(|b| *b != 0) {
        return Err(PrecompileError::InvalidFieldElement);
    }
    let mut limbs = [0u64; 6];
    for (i, chunk) in bytes[16..FP_LEN].chunks_exact(8).enumerate() {
        let mut limb = [0u8; 8];
        limb.copy_from_slice(chunk);
        limbs[5 - i] = u64::from_be_bytes(limb);
    }
    Fq::from_bigint(BigInt::new(limbs)).ok_or(PrecompileError::InvalidFieldElement)
}

fn read_fp2(bytes: &[u8]) -> Result<Fq2, PrecompileError> {
    Ok(Fq2::new(read_fp(&bytes[..FP_LEN])?, read_fp(&bytes[FP_LEN..2 * FP_LEN])?))
}

fn write_fp(out: &mut Vec<u8>, value: &Fq) {
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&value.into_bigint().to_bytes_be());
}

/// G1 point on the curve; the subgroup check is up to the caller
fn read_g1(bytes: &[u8], subgroup_check: bool) -> Result<G1Affine, PrecompileError> {
    let x = read_fp(&bytes[..FP_LEN])?;
    let y = read_fp(&bytes[FP_LEN..G1_LEN])?;
    if x.is_zero() && y.is_zero() {
        return Ok(G1Affine::identity());
    }
    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(PrecompileError::NotOnCurve);
    }
    if subgroup_check && !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PrecompileError::NotInSubgroup);
    }
    Ok(point)
}

fn read_g2(bytes: &[u8], subgroup_check: bool) -> Result<G2Affine, PrecompileError> {
    let x = read_fp2(&bytes[..2 * FP_LEN])?;
    let y = read_fp2(&bytes[2 * FP_LEN..G2_LEN])?;
    if x.is_zero() && y.is_zero() {
        return Ok(G2Affine::identity());
    }
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(PrecompileError::NotOnCurve);
    }
    if subgroup_check && !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PrecompileError::NotInSubgroup);
    }
    Ok(point)
}

fn encode_g1(point: G1Affine) -> Vec<u8> {
    if point.infinity {
        return vec![0u8; G1_LEN];
    }
    let mut out = Vec::with_capacity(G1_LEN);
    write_fp(&mut out, &point.x);
    write_fp(&mut out, &point.y);
    out
}

fn encode_g2(point: G2Affine) -> Vec<u8> {
    if point.infinity {
        return vec![0u8; G2_LEN];
    }
    let mut out = Vec::with_capacity(G2_LEN);
    write_fp(&mut out, &point.x.c0);
    write_fp(&mut out, &point.x.c1);
    write_fp(&mut out, &point.y.c0);
    write_fp(&mut out, &point.y.c1);
    out
}

/// Big-endian scalar as limbs; values above the group order are allowed
fn read_scalar(bytes: &[u8]) -> BigInt<4> {
    let mut limbs = [0u64; 4];
    for (i, chunk) in bytes[..SCALAR_LEN].chunks_exact(8).enumerate() {
        let mut limb = [0u8; 8];
        limb.copy_from_slice(chunk);
        limbs[3 - i] = u64::from_be_bytes(limb);
    }
    BigInt::new(limbs)
}

// ==================== Operations ====================

pub(super) fn g1_add(input: &[u8], gas_limit: u64) -> PrecompileResult {
    if input.len() != 2 * G1_LEN {
        return Err(PrecompileError::InvalidInputLength);
    }
    let gas_used = charge(G1_ADD_COST, gas_limit)?;
    let a = read_g1(&input[..G1_LEN], false)?;
    let b = read_g1(&input[G1_LEN..], false)?;
    Ok(PrecompileOutput::new(gas_used, encode_g1((a + b).into_affine())))
}

pub(super) fn g2_add(input: &[u8], gas_limit: u64) -> PrecompileResult {
    if input.len() != 2 * G2_LEN {
        return Err(PrecompileError::InvalidInputLength);
    }
    let gas_used = charge(G2_ADD_COST, gas_limit)?;
    let a = read_g2(&input[..G2_LEN], false)?;
    let b = read_g2(&input[G2_LEN..], false)?;
    Ok(PrecompileOutput::new(gas_used, encode_g2((a + b).into_affine())))
}

pub(super) fn g1_msm(input: &[u8], gas_limit: u64) -> PrecompileResult {
    if input.is_empty() || input.len() % G1_MSM_PAIR_LEN != 0 {
        return Err(PrecompileError::InvalidInputLength);
    }
    let pairs = input.len() / G1_MSM_PAIR_LEN;
    let gas_used = charge(msm_cost(pairs, &G1_DISCOUNT, G1_MUL_COST), gas_limit)?;

    let mut sum = G1Projective::zero();
    for chunk in input.chunks_exact(G1_MSM_PAIR_LEN) {
        let point = read_g1(&chunk[..G1_LEN], true)?;
        let scalar = read_scalar(&chunk[G1_LEN..]);
        if !scalar.is_zero() {
            sum += point.mul_bigint(scalar);
        }
    }
    Ok(PrecompileOutput::new(gas_used, encode_g1(sum.into_affine())))
}

pub(super) fn g2_msm(input: &[u8], gas_limit: u64) -> PrecompileResult {
    if input.is_empty() || input.len() % G2_MSM_PAIR_LEN != 0 {
        return Err(PrecompileError::InvalidInputLength);
    }
    let pairs = input.len() / G2_MSM_PAIR_LEN;
    let gas_used = charge(msm_cost(pairs, &G2_DISCOUNT, G2_MUL_COST), gas_limit)?;

    let mut sum = G2Projective::zero();
    for chunk in input.chunks_exact(G2_MSM_PAIR_LEN) {
        let point = read_g2(&chunk[..G2_LEN], true)?;
        let scalar = read_scalar(&chunk[G2_LEN..]);
        if !scalar.is_zero() {
            sum += point.mul_bigint(scalar);
        }
    }
    Ok(PrecompileOutput::new(gas_used, encode_g2(sum.into_affine())))
}

pub(super) fn pairing(input: &[u8], gas_limit: u64) -> PrecompileResult {
    if input.is_empty() || input.len() % PAIRING_PAIR_LEN != 0 {
        return Err(PrecompileError::InvalidInputLength);
    }
    let pairs = (input.len() / PAIRING_PAIR_LEN) as u64;
    let cost = PAIRING_PAIR_COST
        .saturating_mul(pairs)
        .saturating_add(PAIRING_BASE_COST);
    let gas_used = charge(cost, gas_limit)?;

    let mut g1_points = Vec::with_capacity(pairs as usize);
    let mut g2_points = Vec::with_capacity(pairs as usize);
    for chunk in input.chunks_exact(PAIRING_PAIR_LEN) {
        g1_points.push(read_g1(&chunk[..G1_LEN], true)?);
        g2_points.push(read_g2(&chunk[G1_LEN..], true)?);
    }

    let holds = Bls12_381::multi_pairing(g1_points, g2_points).0.is_one();
    let mut output = vec![0u8; 32];
    output[31] = holds as u8;
    Ok(PrecompileOutput::new(gas_used, output))
}

pub(super) fn map_fp_to_g1(input: &[u8], gas_limit: u64) -> PrecompileResult {
    if input.len() != FP_LEN {
        return Err(PrecompileError::InvalidInputLength);
    }
    let gas_used = charge(MAP_FP_TO_G1_COST, gas_limit)?;
    let fp = read_fp(input)?;
    let mapped = WBMap::<g1::Config>::map_to_curve(fp).map_err(|_| PrecompileError::NotOnCurve)?;
    Ok(PrecompileOutput::new(gas_used, encode_g1(mapped.clear_cofactor())))
}

pub(super) fn map_fp2_to_g2(input: &[u8], gas_limit: u64) -> PrecompileResult {
    if input.len() != 2 * FP_LEN {
        return Err(PrecompileError::InvalidInputLength);
    }
    let gas_used = charge(MAP_FP2_TO_G2_COST, gas_limit)?;
    let fp2 = read_fp2(input)?;
    let mapped = WBMap::<g2::Config>::map_to_curve(fp2).map_err(|_| PrecompileError::NotOnCurve)?;
    Ok(PrecompileOutput::new(gas_used, encode_g2(mapped.clear_cofactor())))
}
