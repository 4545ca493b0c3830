//! Jump destination analysis

use crate::opcode::Opcode;

/// Bitmap of valid JUMPDEST positions in one code blob.
///
/// A `0x5B` byte inside PUSH immediate data is not a destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JumpDests {
    bits: Vec<u64>,
    len: usize,
}

impl JumpDests {
    /// Scan `code` once
    pub fn analyze(code: &[u8]) -> Self {
        let mut bits = vec![0u64; code.len().div_ceil(64)];
        let mut pc = 0;
        while pc < code.len() {
            let byte = code[pc];
            if byte == Opcode::JUMPDEST.byte() {
                bits[pc / 64] |= 1 << (pc % 64);
                pc += 1;
            } else {
                let immediate = match Opcode::from_byte(byte) {
                    Some(op) => op.push_size(),
                    None => 0,
                };
                pc += 1 + immediate;
            }
        }
        Self {
            bits,
            len: code.len(),
        }
    }

    /// Whether `pc` is a valid jump target
    #[inline]
    pub fn is_valid(&self, pc: usize) -> bool {
        pc < self.len && self.bits[pc / 64] & (1 << (pc % 64)) != 0
    }

    /// Number of valid destinations
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_jumpdests() {
        // JUMPDEST PUSH1 0 JUMPDEST
        let dests = JumpDests::analyze(&[0x5B, 0x60, 0x00, 0x5B]);
        assert!(dests.is_valid(0));
        assert!(!dests.is_valid(1));
        assert!(!dests.is_valid(2));
        assert!(dests.is_valid(3));
        assert!(!dests.is_valid(4));
        assert_eq!(dests.count(), 2);
    }

    #[test]
    fn test_push_data_is_skipped() {
        // PUSH2 0x5B5B JUMPDEST
        let dests = JumpDests::analyze(&[0x61, 0x5B, 0x5B, 0x5B]);
        assert!(!dests.is_valid(1));
        assert!(!dests.is_valid(2));
        assert!(dests.is_valid(3));
    }

    #[test]
    fn test_truncated_push() {
        // PUSH32 with only two immediate bytes
        let dests = JumpDests::analyze(&[0x7F, 0x5B, 0x5B]);
        assert_eq!(dests.count(), 0);
    }

    #[test]
    fn test_long_code_spans_words() {
        let mut code = vec![0x00; 130];
        code[64] = 0x5B;
        code[129] = 0x5B;
        let dests = JumpDests::analyze(&code);
        assert!(dests.is_valid(64));
        assert!(dests.is_valid(129));
        assert!(!dests.is_valid(63));
        assert!(!dests.is_valid(usize::MAX));
    }

    #[test]
    fn test_empty_code() {
        let dests = JumpDests::analyze(&[]);
        assert!(!dests.is_valid(0));
        assert_eq!(dests.count(), 0);
    }
}
