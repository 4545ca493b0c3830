//! State access errors

use cadenza_primitives::Address;
use thiserror::Error;

/// State access error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A checkpoint was closed out of stack order
    #[error("checkpoint mismatch: expected depth {expected}, got {got}")]
    CheckpointMismatch {
        /// Depth of the innermost open checkpoint
        expected: usize,
        /// Depth carried by the token
        got: usize,
    },

    /// Commit or revert with no open checkpoint
    #[error("no open checkpoint")]
    NoOpenCheckpoint,

    /// Transaction boundary crossed while checkpoints are open
    #[error("{0} checkpoints still open")]
    CheckpointsOpen(usize),

    /// Balance arithmetic overflowed
    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),

    /// Balance arithmetic underflowed
    #[error("insufficient balance for {0}")]
    BalanceUnderflow(Address),

    /// Nonce reached its maximum
    #[error("nonce overflow for {0}")]
    NonceOverflow(Address),

    /// Failure in the backing store
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;
