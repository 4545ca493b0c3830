//! Account record

use cadenza_primitives::{H256, U256};

/// Keccak-256 of empty bytes
pub const EMPTY_CODE_HASH: H256 = H256::from_bytes([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// Root of an empty storage trie (keccak-256 of the RLP empty string)
pub const EMPTY_STORAGE_ROOT: H256 = H256::from_bytes([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

/// Account data as seen by the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Account nonce
    pub nonce: u64,
    /// Balance in wei
    pub balance: U256,
    /// Keccak-256 of the code, or [`EMPTY_CODE_HASH`]
    pub code_hash: H256,
    /// Storage root; the engine carries it but never interprets it
    pub storage_root: H256,
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}

impl Account {
    /// Create a new empty account
    pub fn new() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            code_hash: EMPTY_CODE_HASH,
            storage_root: EMPTY_STORAGE_ROOT,
        }
    }

    /// Create an account holding `balance`
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Self::new()
        }
    }

    /// Check if account is empty (EIP-161)
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == EMPTY_CODE_HASH
    }

    /// Check if account has code
    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_is_empty() {
        let account = Account::new();
        assert!(account.is_empty());
        assert!(!account.has_code());
        assert_eq!(account, Account::default());
    }

    #[test]
    fn test_account_with_balance_not_empty() {
        let account = Account::with_balance(U256::from(1u64));
        assert!(!account.is_empty());
    }

    #[test]
    fn test_account_with_nonce_not_empty() {
        let account = Account {
            nonce: 1,
            ..Account::new()
        };
        assert!(!account.is_empty());
    }

    #[test]
    fn test_account_with_code_not_empty() {
        let account = Account {
            code_hash: H256::from_bytes([1u8; 32]),
            ..Account::new()
        };
        assert!(account.has_code());
        assert!(!account.is_empty());
    }
}
