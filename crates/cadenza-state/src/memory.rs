//! In-memory state with snapshot checkpoints

use crate::account::{Account, EMPTY_CODE_HASH};
use crate::error::{StateError, StateResult};
use crate::traits::{Checkpoint, StateAccess};
use bytes::Bytes;
use cadenza_crypto::keccak256;
use cadenza_primitives::{Address, H256, U256};
use std::collections::{HashMap, HashSet};

/// Everything a checkpoint restores
#[derive(Clone, Debug, Default)]
struct World {
    accounts: HashMap<Address, Account>,
    storage: HashMap<Address, HashMap<H256, H256>>,
    transient: HashMap<(Address, H256), H256>,
    warm_addresses: HashSet<Address>,
    warm_slots: HashSet<(Address, H256)>,
}

/// Counters for checkpoint auditing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckpointStats {
    /// Checkpoints opened
    pub opened: usize,
    /// Checkpoints committed
    pub committed: usize,
    /// Checkpoints reverted
    pub reverted: usize,
}

impl CheckpointStats {
    /// Every opened checkpoint has been closed
    pub fn is_balanced(&self) -> bool {
        self.opened == self.committed + self.reverted
    }
}

/// In-memory [`StateAccess`] implementation.
///
/// Each checkpoint stores a snapshot of the mutable world; reverting
/// restores it and committing drops it. Code blobs are content addressed and
/// never rolled back.
#[derive(Clone, Debug, Default)]
pub struct MemoryState {
    world: World,
    code: HashMap<H256, Bytes>,
    /// Slot values at the start of the transaction, captured on first write
    original_storage: HashMap<(Address, H256), H256>,
    snapshots: Vec<World>,
    stats: CheckpointStats,
}

impl MemoryState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with balance and code (builder style, for tests and genesis)
    pub fn with_account(mut self, address: Address, balance: U256, code: impl Into<Bytes>) -> Self {
        self.insert_account(address, balance, code.into());
        self
    }

    /// Seed an account with balance and code
    pub fn insert_account(&mut self, address: Address, balance: U256, code: Bytes) {
        let mut account = Account::with_balance(balance);
        if !code.is_empty() {
            let hash = keccak256(&code);
            self.code.insert(hash, code);
            account.code_hash = hash;
        }
        self.world.accounts.insert(address, account);
    }

    /// Seed a storage slot without going through transaction bookkeeping
    pub fn insert_storage(&mut self, address: Address, key: H256, value: H256) {
        self.world
            .storage
            .entry(address)
            .or_default()
            .insert(key, value);
    }

    /// All non-zero storage slots of an account
    pub fn storage_of(&self, address: &Address) -> HashMap<H256, H256> {
        self.world
            .storage
            .get(address)
            .map(|slots| {
                slots
                    .iter()
                    .filter(|(_, value)| !value.is_zero())
                    .map(|(k, v)| (*k, *v))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Addresses of all accounts
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.world.accounts.keys()
    }

    /// Number of checkpoints currently open
    pub fn open_checkpoints(&self) -> usize {
        self.snapshots.len()
    }

    /// Checkpoint counters since creation
    pub fn checkpoint_stats(&self) -> CheckpointStats {
        self.stats
    }

    fn check_innermost(&self, checkpoint: &Checkpoint) -> StateResult<()> {
        let expected = self.snapshots.len();
        if expected == 0 {
            return Err(StateError::NoOpenCheckpoint);
        }
        if checkpoint.depth() != expected {
            return Err(StateError::CheckpointMismatch {
                expected,
                got: checkpoint.depth(),
            });
        }
        Ok(())
    }
}

impl StateAccess for MemoryState {
    fn get_account(&self, address: &Address) -> StateResult<Option<Account>> {
        Ok(self.world.accounts.get(address).cloned())
    }

    fn put_account(&mut self, address: Address, account: Account) -> StateResult<()> {
        self.world.accounts.insert(address, account);
        Ok(())
    }

    fn delete_account(&mut self, address: &Address) -> StateResult<()> {
        self.world.accounts.remove(address);
        self.world.storage.remove(address);
        Ok(())
    }

    fn get_code(&self, address: &Address) -> StateResult<Bytes> {
        let code = self
            .world
            .accounts
            .get(address)
            .filter(|account| account.code_hash != EMPTY_CODE_HASH)
            .and_then(|account| self.code.get(&account.code_hash))
            .cloned()
            .unwrap_or_default();
        Ok(code)
    }

    fn put_code(&mut self, address: Address, code: Bytes) -> StateResult<()> {
        let hash = if code.is_empty() {
            EMPTY_CODE_HASH
        } else {
            let hash = keccak256(&code);
            self.code.insert(hash, code);
            hash
        };
        self.world.accounts.entry(address).or_default().code_hash = hash;
        Ok(())
    }

    fn get_storage(&self, address: &Address, key: &H256) -> StateResult<H256> {
        Ok(self
            .world
            .storage
            .get(address)
            .and_then(|slots| slots.get(key))
            .copied()
            .unwrap_or_default())
    }

    fn get_original_storage(&self, address: &Address, key: &H256) -> StateResult<H256> {
        match self.original_storage.get(&(*address, *key)) {
            Some(original) => Ok(*original),
            None => self.get_storage(address, key),
        }
    }

    fn put_storage(&mut self, address: Address, key: H256, value: H256) -> StateResult<()> {
        if !self.original_storage.contains_key(&(address, key)) {
            let current = self.get_storage(&address, &key)?;
            self.original_storage.insert((address, key), current);
        }
        self.world
            .storage
            .entry(address)
            .or_default()
            .insert(key, value);
        Ok(())
    }

    fn get_transient(&self, address: &Address, key: &H256) -> H256 {
        self.world
            .transient
            .get(&(*address, *key))
            .copied()
            .unwrap_or_default()
    }

    fn put_transient(&mut self, address: Address, key: H256, value: H256) {
        self.world.transient.insert((address, key), value);
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.snapshots.push(self.world.clone());
        self.stats.opened += 1;
        tracing::trace!(depth = self.snapshots.len(), "checkpoint opened");
        Checkpoint::new(self.snapshots.len())
    }

    fn commit(&mut self, checkpoint: Checkpoint) -> StateResult<()> {
        self.check_innermost(&checkpoint)?;
        self.snapshots.pop();
        self.stats.committed += 1;
        tracing::trace!(depth = checkpoint.depth(), "checkpoint committed");
        Ok(())
    }

    fn revert(&mut self, checkpoint: Checkpoint) -> StateResult<()> {
        self.check_innermost(&checkpoint)?;
        if let Some(snapshot) = self.snapshots.pop() {
            self.world = snapshot;
        }
        self.stats.reverted += 1;
        tracing::trace!(depth = checkpoint.depth(), "checkpoint reverted");
        Ok(())
    }

    fn is_warm_address(&self, address: &Address) -> bool {
        self.world.warm_addresses.contains(address)
    }

    fn mark_warm_address(&mut self, address: Address) -> bool {
        self.world.warm_addresses.insert(address)
    }

    fn is_warm_slot(&self, address: &Address, key: &H256) -> bool {
        self.world.warm_slots.contains(&(*address, *key))
    }

    fn mark_warm_slot(&mut self, address: Address, key: H256) -> bool {
        self.world.warm_slots.insert((address, key))
    }

    fn begin_transaction(&mut self) -> StateResult<()> {
        if !self.snapshots.is_empty() {
            return Err(StateError::CheckpointsOpen(self.snapshots.len()));
        }
        self.world.warm_addresses.clear();
        self.world.warm_slots.clear();
        self.world.transient.clear();
        self.original_storage.clear();
        Ok(())
    }
}
