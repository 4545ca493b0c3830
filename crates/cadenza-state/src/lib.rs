//! # cadenza-state
//!
//! The state access interface consumed by the execution engine, plus an
//! in-memory implementation.
//!
//! - [`StateAccess`]: accounts, storage, code, transient storage,
//!   nested checkpoints and EIP-2929 warm/cold bookkeeping
//! - [`MemoryState`]: snapshot-based implementation used by tests and
//!   local simulation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod error;
mod memory;
mod traits;

pub use account::{Account, EMPTY_CODE_HASH, EMPTY_STORAGE_ROOT};
pub use error::{StateError, StateResult};
pub use memory::{CheckpointStats, MemoryState};
pub use traits::{Checkpoint, StateAccess};
