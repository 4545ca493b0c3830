//! KZG point evaluation (EIP-4844)

use super::{charge, PrecompileError, PrecompileOutput, PrecompileResult};
use ark_bls12_381::{Bls12_381, Fr, G1Affine, G2Affine};
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInteger, One, PrimeField};
use ark_serialize::CanonicalDeserialize;
use std::ops::Neg;

const COST: u64 = 50_000;
const INPUT_LEN: usize = 192;
const VERSIONED_HASH_VERSION: u8 = 0x01;

/// FIELD_ELEMENTS_PER_BLOB, then the BLS12-381 scalar modulus
const RETURN_VALUE: [u8; 64] = {
    let modulus: [u8; 32] = [
        0x73, 0xed, 0xa7, 0x53, 0x29, 0x9d, 0x7d, 0x48, 0x33, 0x39, 0xd8, 0x08, 0x09, 0xa1,
        0xd8, 0x05, 0x53, 0xbd, 0xa4, 0x02, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0xff, 0xff, 0xff,
        0x00, 0x00, 0x00, 0x01,
    ];
    let mut out = [0u8; 64];
    out[30] = 0x10;
    let mut i = 0;
    while i < 32 {
        out[32 + i] = modulus[i];
        i += 1;
    }
    out
};

/// `[tau]G2` from the mainnet KZG ceremony, compressed
const TAU_G2: &str = "b5bfd7dd8cdeb128843bc287230af38926187075cbfbefa81009a2ce615ac53d\
                      2914e5870cb452d2afaaab24f3499f72185cbfee53492714734429b7b38608e2\
                      3926c911cceceac9a36851477ba4c60b087041de621000edc98edada20c1def2";

fn versioned_hash(commitment: &[u8]) -> [u8; 32] {
    let mut hash = cadenza_crypto::sha256(commitment);
    hash[0] = VERSIONED_HASH_VERSION;
    hash
}

fn read_g1(bytes: &[u8]) -> Result<G1Affine, PrecompileError> {
    G1Affine::deserialize_compressed(bytes).map_err(|_| PrecompileError::NotOnCurve)
}

/// Scalar that must already be reduced
fn read_scalar(bytes: &[u8]) -> Result<Fr, PrecompileError> {
    let fr = Fr::from_be_bytes_mod_order(bytes);
    if fr.into_bigint().to_bytes_be() != bytes {
        return Err(PrecompileError::InvalidFieldElement);
    }
    Ok(fr)
}

fn tau_g2() -> Result<G2Affine, PrecompileError> {
    let bytes = hex::decode(TAU_G2).map_err(|_| PrecompileError::InvalidProof)?;
    G2Affine::deserialize_compressed_unchecked(&bytes[..]).map_err(|_| PrecompileError::InvalidProof)
}

/// `e(C - [y]G1, -G2) * e(proof, [tau]G2 - [z]G2) == 1`
fn verify(commitment: G1Affine, z: Fr, y: Fr, proof: G1Affine) -> Result<bool, PrecompileError> {
    let g1 = G1Affine::generator();
    let g2 = G2Affine::generator();

    let p_minus_y = (commitment.into_group() - g1.mul_bigint(y.into_bigint())).into_affine();
    let x_minus_z = (tau_g2()?.into_group() - g2.mul_bigint(z.into_bigint())).into_affine();

    let pairing = Bls12_381::multi_pairing([p_minus_y, proof], [g2.neg(), x_minus_z]);
    Ok(pairing.0.is_one())
}

/// `versioned_hash (32) || z (32) || y (32) || commitment (48) || proof (48)`
pub(super) fn point_evaluation(input: &[u8], gas_limit: u64) -> PrecompileResult {
    let gas_used = charge(COST, gas_limit)?;
    if input.len() != INPUT_LEN {
        return Err(PrecompileError::InvalidInputLength);
    }

    let commitment_bytes = &input[96..144];
    if versioned_hash(commitment_bytes) != input[..32] {
        return Err(PrecompileError::VersionedHashMismatch);
    }

    let z = read_scalar(&input[32..64])?;
    let y = read_scalar(&input[64..96])?;
    let commitment = read_g1(commitment_bytes)?;
    let proof = read_g1(&input[144..192])?;

    if !verify(commitment, z, y, proof)? {
        return Err(PrecompileError::InvalidProof);
    }
    Ok(PrecompileOutput::new(gas_used, RETURN_VALUE.to_vec()))
}
