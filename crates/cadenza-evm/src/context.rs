//! Block and transaction context

use cadenza_primitives::{Address, H256, U256};
use std::collections::BTreeMap;

/// Number of recent blocks whose hashes BLOCKHASH can see
pub const BLOCKHASH_WINDOW: u64 = 256;

/// Block environment information
#[derive(Clone, Debug)]
pub struct BlockContext {
    /// Block number
    pub number: u64,
    /// Block timestamp
    pub timestamp: u64,
    /// Block gas limit
    pub gas_limit: u64,
    /// Block coinbase (miner/validator)
    pub coinbase: Address,
    /// Block difficulty/prevrandao
    pub prevrandao: H256,
    /// Chain ID
    pub chain_id: u64,
    /// Base fee (EIP-1559)
    pub base_fee: U256,
    /// Blob base fee (EIP-7516)
    pub blob_base_fee: U256,
    /// Hashes of ancestor blocks, by number
    pub block_hashes: BTreeMap<u64, H256>,
}

impl BlockContext {
    /// Hash of block `number` as seen by BLOCKHASH.
    ///
    /// Only the 256 most recent ancestors are visible; anything else, including
    /// the current block, is zero.
    pub fn block_hash(&self, number: U256) -> H256 {
        if number >= U256::from(self.number) {
            return H256::ZERO;
        }
        let number = number.as_u64();
        if self.number - number > BLOCKHASH_WINDOW {
            return H256::ZERO;
        }
        self.block_hashes.get(&number).copied().unwrap_or(H256::ZERO)
    }
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            number: 0,
            timestamp: 0,
            gas_limit: 30_000_000,
            coinbase: Address::ZERO,
            prevrandao: H256::ZERO,
            chain_id: 1,
            base_fee: U256::zero(),
            blob_base_fee: U256::one(),
            block_hashes: BTreeMap::new(),
        }
    }
}

/// Transaction environment information
#[derive(Clone, Debug, Default)]
pub struct TxContext {
    /// Transaction origin (original sender)
    pub origin: Address,
    /// Gas price
    pub gas_price: U256,
    /// Versioned blob hashes (EIP-4844)
    pub blob_hashes: Vec<H256>,
}

/// Complete execution environment
#[derive(Clone, Debug, Default)]
pub struct Environment {
    /// Block context
    pub block: BlockContext,
    /// Transaction context
    pub tx: TxContext,
}

impl Environment {
    /// Create new environment
    pub fn new(block: BlockContext, tx: TxContext) -> Self {
        Self { block, tx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_block_context() {
        let ctx = BlockContext::default();
        assert_eq!(ctx.gas_limit, 30_000_000);
        assert_eq!(ctx.chain_id, 1);
        assert!(ctx.base_fee.is_zero());
    }

    #[test]
    fn test_block_hash_window() {
        let mut ctx = BlockContext {
            number: 1000,
            ..Default::default()
        };
        let hash = H256::from_word(U256::from(0xAA));
        ctx.block_hashes.insert(999, hash);
        ctx.block_hashes.insert(744, hash);
        ctx.block_hashes.insert(743, hash);

        assert_eq!(ctx.block_hash(U256::from(999)), hash);
        assert_eq!(ctx.block_hash(U256::from(744)), hash);
        assert_eq!(ctx.block_hash(U256::from(743)), H256::ZERO);
        assert_eq!(ctx.block_hash(U256::from(1000)), H256::ZERO);
        assert_eq!(ctx.block_hash(U256::MAX), H256::ZERO);
        assert_eq!(ctx.block_hash(U256::from(998)), H256::ZERO);
    }
}
