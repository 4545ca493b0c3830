//! MODEXP (EIP-198), repriced by EIP-2565

use super::{charge, PrecompileError, PrecompileOutput, PrecompileResult};
use cadenza_primitives::U256;
use num_bigint::BigUint;

const HEADER_LEN: usize = 96;

pub(super) fn byzantium(input: &[u8], gas_limit: u64) -> PrecompileResult {
    run(input, gas_limit, byzantium_cost)
}

pub(super) fn berlin(input: &[u8], gas_limit: u64) -> PrecompileResult {
    run(input, gas_limit, berlin_cost)
}

/// `len` bytes of `input` starting at `offset`, zero-filled past the end
fn padded(input: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if offset < input.len() {
        let available = (input.len() - offset).min(len);
        out[..available].copy_from_slice(&input[offset..offset + available]);
    }
    out
}

fn read_len(input: &[u8], offset: usize) -> U256 {
    U256::from_big_endian(&padded(input, offset, 32))
}

fn iteration_count(exp_len: u64, exp_head: &U256) -> u64 {
    let count = if exp_len <= 32 {
        (exp_head.bits() as u64).saturating_sub(1)
    } else {
        8u64.saturating_mul(exp_len - 32)
            .saturating_add((exp_head.bits() as u64).max(1) - 1)
    };
    count.max(1)
}

fn byzantium_complexity(x: u64) -> u128 {
    let x = x as u128;
    if x <= 64 {
        x * x
    } else if x <= 1024 {
        x * x / 4 + 96 * x - 3072
    } else {
        x * x / 16 + 480 * x - 199_680
    }
}

fn byzantium_cost(base_len: u64, exp_len: u64, mod_len: u64, exp_head: &U256) -> u64 {
    let complexity = byzantium_complexity(base_len.max(mod_len));
    let gas = complexity.saturating_mul(iteration_count(exp_len, exp_head) as u128) / 20;
    u64::try_from(gas).unwrap_or(u64::MAX)
}

fn berlin_cost(base_len: u64, exp_len: u64, mod_len: u64, exp_head: &U256) -> u64 {
    let words = base_len.max(mod_len).div_ceil(8) as u128;
    let gas = (words * words).saturating_mul(iteration_count(exp_len, exp_head) as u128) / 3;
    u64::try_from(gas).unwrap_or(u64::MAX).max(200)
}

fn run(
    input: &[u8],
    gas_limit: u64,
    cost: fn(u64, u64, u64, &U256) -> u64,
) -> PrecompileResult {
    let base_len = read_len(input, 0);
    let exp_len = read_len(input, 32);
    let mod_len = read_len(input, 64);

    // no realistic gas limit covers operands this long
    let too_long = U256::from(u32::MAX);
    if base_len > too_long || mod_len > too_long {
        return Err(PrecompileError::OutOfGas);
    }
    let (base_len, mod_len) = (base_len.as_u64() as usize, mod_len.as_u64() as usize);
    let exp_len = cadenza_primitives::word_to_u64_saturating(&exp_len);

    let body = input.get(HEADER_LEN..).unwrap_or_default();
    let head_len = exp_len.min(32) as usize;
    let exp_head = U256::from_big_endian(&padded(body, base_len, head_len));

    let gas_used = charge(
        cost(base_len as u64, exp_len, mod_len as u64, &exp_head),
        gas_limit,
    )?;
    if mod_len == 0 {
        return Ok(PrecompileOutput::new(gas_used, Vec::new()));
    }

    if exp_len > u32::MAX as u64 {
        return Err(PrecompileError::OutOfGas);
    }
    let exp_len = exp_len as usize;
    let base = BigUint::from_bytes_be(&padded(body, 0, base_len));
    let exponent = BigUint::from_bytes_be(&padded(body, base_len, exp_len));
    let modulus = BigUint::from_bytes_be(&padded(body, base_len + exp_len, mod_len));

    let result = if modulus == BigUint::from(0u8) {
        Vec::new()
    } else {
        base.modpow(&exponent, &modulus).to_bytes_be()
    };

    // the result is below the modulus, so it always fits
    let mut output = vec![0u8; mod_len];
    output[mod_len - result.len()..].copy_from_slice(&result);
    Ok(PrecompileOutput::new(gas_used, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(base: u64, exp: u64, modulus: u64) -> Vec<u8> {
        let mut input = Vec::new();
        for len in [base, exp, modulus] {
            let mut word = [0u8; 32];
            U256::from(len).to_big_endian(&mut word);
            input.extend_from_slice(&word);
        }
        input
    }

    #[test]
    fn test_small_modexp() {
        // 3^5 mod 7 = 5
        let mut input = header(1, 1, 1);
        input.extend_from_slice(&[3, 5, 7]);
        let result = berlin(&input, 1000).unwrap();
        assert_eq!(result.output.as_ref(), &[5]);
        assert_eq!(result.gas_used, 200);
    }

    #[test]
    fn test_output_padded_to_modulus_length() {
        // 2^2 mod 0x0100 = 4, two output bytes
        let mut input = header(1, 1, 2);
        input.extend_from_slice(&[2, 2, 1, 0]);
        let result = berlin(&input, 1000).unwrap();
        assert_eq!(result.output.as_ref(), &[0, 4]);
    }

    #[test]
    fn test_zero_modulus_and_empty() {
        let mut input = header(1, 1, 1);
        input.extend_from_slice(&[3, 5, 0]);
        assert_eq!(berlin(&input, 1000).unwrap().output.as_ref(), &[0]);

        let result = berlin(&header(0, 0, 0), 1000).unwrap();
        assert!(result.output.is_empty());
        assert_eq!(result.gas_used, 200);
    }

    #[test]
    fn test_truncated_body_is_zero_padded() {
        // base 3, exponent missing (reads as 0), modulus missing (reads as 0)
        let mut input = header(1, 1, 1);
        input.push(3);
        assert_eq!(berlin(&input, 1000).unwrap().output.as_ref(), &[0]);
    }

    #[test]
    fn test_byzantium_pricing() {
        // 64-byte operands with a 32-byte exponent of value 1: 64^2 * 1 / 20
        let mut input = header(64, 32, 64);
        input.extend_from_slice(&[0u8; 64]);
        let mut exponent = [0u8; 32];
        exponent[31] = 1;
        input.extend_from_slice(&exponent);
        input.extend_from_slice(&[0xffu8; 64]);
        let result = byzantium(&input, 1_000_000).unwrap();
        assert_eq!(result.gas_used, 64 * 64 / 20);
    }

    #[test]
    fn test_iteration_count() {
        assert_eq!(iteration_count(0, &U256::zero()), 1);
        assert_eq!(iteration_count(1, &U256::from(0x80)), 7);
        assert_eq!(iteration_count(33, &U256::one()), 8);
        assert_eq!(iteration_count(33, &U256::zero()), 8);
    }

    #[test]
    fn test_huge_lengths_are_out_of_gas() {
        let mut input = header(0, 0, 0);
        input[0] = 0xff;
        assert_eq!(berlin(&input, u64::MAX), Err(PrecompileError::OutOfGas));

        let input = header(1, u64::MAX, 1);
        assert_eq!(berlin(&input, 10_000_000), Err(PrecompileError::OutOfGas));
    }
}
