//! State access interface consumed by the execution engine

use crate::account::{Account, EMPTY_CODE_HASH};
use crate::error::{StateError, StateResult};
use bytes::Bytes;
use cadenza_primitives::{Address, H256, U256};

/// Opaque token for one open checkpoint.
///
/// Tokens are neither `Clone` nor `Copy`: a checkpoint is closed exactly once,
/// by passing its token to [`StateAccess::commit`] or [`StateAccess::revert`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a checkpoint must be committed or reverted"]
pub struct Checkpoint(usize);

impl Checkpoint {
    /// Create a token for the checkpoint at `depth` (1 = outermost)
    pub fn new(depth: usize) -> Self {
        Checkpoint(depth)
    }

    /// Nesting depth of this checkpoint
    pub fn depth(&self) -> usize {
        self.0
    }
}

/// Everything the engine reads or writes outside its own call frames.
///
/// Checkpoints nest with stack discipline. Warm address and slot sets are
/// transaction scoped and restored together with checkpoints, so a reverted
/// frame only forgets the warming it did itself.
pub trait StateAccess {
    /// Get account by address
    fn get_account(&self, address: &Address) -> StateResult<Option<Account>>;

    /// Insert or replace an account
    fn put_account(&mut self, address: Address, account: Account) -> StateResult<()>;

    /// Remove an account together with its storage
    fn delete_account(&mut self, address: &Address) -> StateResult<()>;

    /// Code deployed at `address` (empty when none)
    fn get_code(&self, address: &Address) -> StateResult<Bytes>;

    /// Install code at `address`, updating the account's code hash
    fn put_code(&mut self, address: Address, code: Bytes) -> StateResult<()>;

    /// Current value of a storage slot
    fn get_storage(&self, address: &Address, key: &H256) -> StateResult<H256>;

    /// Value of a storage slot at the start of the current transaction
    fn get_original_storage(&self, address: &Address, key: &H256) -> StateResult<H256>;

    /// Write a storage slot
    fn put_storage(&mut self, address: Address, key: H256, value: H256) -> StateResult<()>;

    /// Read transient storage (EIP-1153)
    fn get_transient(&self, address: &Address, key: &H256) -> H256;

    /// Write transient storage (EIP-1153)
    fn put_transient(&mut self, address: Address, key: H256, value: H256);

    /// Open a nested checkpoint
    fn checkpoint(&mut self) -> Checkpoint;

    /// Keep every change made since `checkpoint` was opened
    fn commit(&mut self, checkpoint: Checkpoint) -> StateResult<()>;

    /// Discard every change made since `checkpoint` was opened
    fn revert(&mut self, checkpoint: Checkpoint) -> StateResult<()>;

    /// Whether `address` was accessed earlier in this transaction
    fn is_warm_address(&self, address: &Address) -> bool;

    /// Mark `address` warm, returning `true` if it was cold
    fn mark_warm_address(&mut self, address: Address) -> bool;

    /// Whether the slot was accessed earlier in this transaction
    fn is_warm_slot(&self, address: &Address, key: &H256) -> bool;

    /// Mark the slot warm, returning `true` if it was cold
    fn mark_warm_slot(&mut self, address: Address, key: H256) -> bool;

    /// Start a new transaction: forget warm sets, transient storage and
    /// original slot values. Fails while a checkpoint is open.
    fn begin_transaction(&mut self) -> StateResult<()>;

    /// Check if account exists
    fn account_exists(&self, address: &Address) -> StateResult<bool> {
        Ok(self.get_account(address)?.is_some())
    }

    /// Non-existent or empty per EIP-161
    fn is_empty(&self, address: &Address) -> StateResult<bool> {
        Ok(self
            .get_account(address)?
            .map_or(true, |account| account.is_empty()))
    }

    /// Get account nonce
    fn get_nonce(&self, address: &Address) -> StateResult<u64> {
        Ok(self.get_account(address)?.map_or(0, |a| a.nonce))
    }

    /// Get account balance
    fn get_balance(&self, address: &Address) -> StateResult<U256> {
        Ok(self.get_account(address)?.map_or_else(U256::zero, |a| a.balance))
    }

    /// Get account code hash; zero for non-existent accounts (EIP-1052)
    fn get_code_hash(&self, address: &Address) -> StateResult<H256> {
        Ok(match self.get_account(address)? {
            Some(account) if !account.is_empty() => account.code_hash,
            Some(_) => EMPTY_CODE_HASH,
            None => H256::ZERO,
        })
    }

    /// Credit `amount`, creating the account if needed
    fn add_balance(&mut self, address: Address, amount: U256) -> StateResult<()> {
        let mut account = self.get_account(&address)?.unwrap_or_default();
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow(address))?;
        self.put_account(address, account)
    }

    /// Debit `amount`
    fn sub_balance(&mut self, address: Address, amount: U256) -> StateResult<()> {
        let mut account = self.get_account(&address)?.unwrap_or_default();
        account.balance = account
            .balance
            .checked_sub(amount)
            .ok_or(StateError::BalanceUnderflow(address))?;
        self.put_account(address, account)
    }

    /// Increment the nonce, returning the value before the increment
    fn increment_nonce(&mut self, address: Address) -> StateResult<u64> {
        let mut account = self.get_account(&address)?.unwrap_or_default();
        let previous = account.nonce;
        account.nonce = previous
            .checked_add(1)
            .ok_or(StateError::NonceOverflow(address))?;
        self.put_account(address, account)?;
        Ok(previous)
    }
}
