//! Word arithmetic with two's complement and 512-bit intermediates

use cadenza_primitives::{U256, U512};

/// Check if a value is negative in two's complement
#[inline]
pub fn is_negative(v: &U256) -> bool {
    v.bit(255)
}

/// Two's complement negation: ~v + 1
#[inline]
pub fn twos_complement(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

fn abs(v: U256) -> U256 {
    if is_negative(&v) {
        twos_complement(v)
    } else {
        v
    }
}

/// Signed division truncating toward zero; `x / 0 = 0`
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let quotient = abs(a) / abs(b);
    if is_negative(&a) != is_negative(&b) {
        twos_complement(quotient)
    } else {
        quotient
    }
}

/// Signed modulo taking the sign of the dividend; `x % 0 = 0`
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let rem = abs(a) % abs(b);
    if is_negative(&a) {
        twos_complement(rem)
    } else {
        rem
    }
}

/// Signed less than
pub fn slt(a: &U256, b: &U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

/// Signed greater than
pub fn sgt(a: &U256, b: &U256) -> bool {
    slt(b, a)
}

/// `(a + b) % n` without intermediate overflow; zero when `n` is zero
pub fn addmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let sum = U512::from(a) + U512::from(b);
    narrow(sum % U512::from(n))
}

/// `(a * b) % n` without intermediate overflow; zero when `n` is zero
pub fn mulmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let product = a.full_mul(b);
    narrow(product % U512::from(n))
}

fn narrow(v: U512) -> U256 {
    // callers reduce modulo a 256-bit value first
    U256::try_from(v).unwrap_or_default()
}

/// Exponentiation modulo 2^256
pub fn exp(base: U256, exponent: U256) -> U256 {
    base.overflowing_pow(exponent).0
}

/// Extend the sign of the `(b + 1)`-byte value in `x`
pub fn signextend(b: U256, x: U256) -> U256 {
    if b >= U256::from(31) {
        return x;
    }
    let bit = b.as_usize() * 8 + 7;
    let mask = (U256::one() << bit) - U256::one();
    if x.bit(bit) {
        x | !mask
    } else {
        x & mask
    }
}

/// Byte `i` of `x`, counting from the most significant
pub fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32) {
        return U256::zero();
    }
    U256::from(x.byte(31 - i.as_usize()))
}

/// Logical shift left
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }
    value << shift.as_usize()
}

/// Logical shift right
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }
    value >> shift.as_usize()
}

/// Arithmetic shift right
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(&value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let shift = shift.as_usize();
    if !negative || shift == 0 {
        return value >> shift;
    }
    (value >> shift) | (U256::MAX << (256 - shift))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(n: u64) -> U256 {
        U256::from(n)
    }

    fn neg(n: u64) -> U256 {
        twos_complement(U256::from(n))
    }

    // ==================== Signed Arithmetic Tests ====================

    #[test]
    fn test_sdiv() {
        assert_eq!(sdiv(w(10), w(3)), w(3));
        assert_eq!(sdiv(neg(10), w(3)), neg(3));
        assert_eq!(sdiv(neg(10), neg(3)), w(3));
        assert_eq!(sdiv(w(10), w(0)), w(0));
        // -2^255 / -1 overflows back to -2^255
        let min = U256::one() << 255;
        assert_eq!(sdiv(min, neg(1)), min);
    }

    #[test]
    fn test_smod() {
        assert_eq!(smod(w(10), w(3)), w(1));
        assert_eq!(smod(neg(10), w(3)), neg(1));
        assert_eq!(smod(w(10), neg(3)), w(1));
        assert_eq!(smod(neg(10), w(0)), w(0));
    }

    #[test]
    fn test_signed_compare() {
        assert!(slt(&neg(1), &w(0)));
        assert!(!slt(&w(0), &neg(1)));
        assert!(slt(&neg(2), &neg(1)));
        assert!(sgt(&w(1), &neg(1)));
        assert!(!slt(&w(5), &w(5)));
    }

    // ==================== Modular Arithmetic Tests ====================

    #[test]
    fn test_addmod_no_overflow_loss() {
        assert_eq!(addmod(U256::MAX, w(2), w(10)), w(7));
        assert_eq!(addmod(w(5), w(5), w(0)), w(0));
    }

    #[test]
    fn test_mulmod_full_width() {
        assert_eq!(mulmod(U256::MAX, U256::MAX, w(12)), w(9));
        assert_eq!(mulmod(w(3), w(4), w(5)), w(2));
        assert_eq!(mulmod(w(3), w(4), w(0)), w(0));
    }

    #[test]
    fn test_exp_wraps() {
        assert_eq!(exp(w(2), w(10)), w(1024));
        assert_eq!(exp(w(2), w(256)), w(0));
        assert_eq!(exp(w(0), w(0)), w(1));
    }

    // ==================== Bit Tests ====================

    #[test]
    fn test_signextend() {
        assert_eq!(signextend(w(0), w(0xFF)), U256::MAX);
        assert_eq!(signextend(w(0), w(0x7F)), w(0x7F));
        assert_eq!(signextend(w(1), w(0x1_80FF)), neg(0x7F01));
        assert_eq!(signextend(w(30), U256::MAX >> 8), U256::MAX);
        assert_eq!(signextend(w(30), U256::MAX >> 9), U256::MAX >> 9);
        assert_eq!(signextend(w(31), w(0xFF)), w(0xFF));
        assert_eq!(signextend(U256::MAX, w(0xFF)), w(0xFF));
    }

    #[test]
    fn test_byte() {
        let x = U256::from_big_endian(&[
            0xAA, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
            24, 25, 26, 27, 28, 29, 30, 0xBB,
        ]);
        assert_eq!(byte(w(0), x), w(0xAA));
        assert_eq!(byte(w(31), x), w(0xBB));
        assert_eq!(byte(w(32), x), w(0));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl(w(1), w(1)), w(2));
        assert_eq!(shl(w(256), w(1)), w(0));
        assert_eq!(shr(w(4), w(0xFF)), w(0xF));
        assert_eq!(shr(U256::MAX, w(1)), w(0));
    }

    #[test]
    fn test_sar() {
        assert_eq!(sar(w(1), neg(2)), neg(1));
        assert_eq!(sar(w(4), neg(1)), neg(1));
        assert_eq!(sar(w(300), neg(5)), U256::MAX);
        assert_eq!(sar(w(300), w(5)), w(0));
        assert_eq!(sar(w(1), w(4)), w(2));
        assert_eq!(sar(w(0), neg(7)), neg(7));
    }
}
