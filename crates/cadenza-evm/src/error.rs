//! Engine error types

use cadenza_state::StateError;
use thiserror::Error;

/// Exceptional halt of one call frame.
///
/// An exceptional halt consumes all gas given to the frame and reverts its
/// checkpoint. It never crosses the frame boundary as an `Err`: the parent
/// only sees a failed [`ExecResult`](crate::ExecResult).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionalHalt {
    /// Out of gas
    #[error("out of gas")]
    OutOfGas,

    /// Stack underflow
    #[error("stack underflow")]
    StackUnderflow,

    /// Stack overflow
    #[error("stack overflow (max 1024)")]
    StackOverflow,

    /// Jump to a byte that is not a JUMPDEST
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// Unassigned or inactive opcode, or INVALID
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// State write attempted in a static context
    #[error("state modification in static context")]
    StaticStateChange,

    /// Contract creation hit an existing account
    #[error("contract address collision")]
    CreateCollision,

    /// Deployed code larger than the limit (EIP-170)
    #[error("max code size exceeded")]
    CodeSizeExceedsMaximum,

    /// Init code larger than the limit (EIP-3860)
    #[error("initcode size exceeds limit")]
    InitcodeSizeViolation,

    /// Deployed code starts with 0xEF (EIP-3541)
    #[error("deployed code starts with 0xEF")]
    InvalidCodePrefix,

    /// Value transfer not covered by the sender balance
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Refund counter would drop below zero
    #[error("refund counter exhausted")]
    RefundExhausted,

    /// Balance or nonce arithmetic overflowed
    #[error("value overflow")]
    ValueOverflow,

    /// RETURNDATACOPY past the end of the return buffer
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,

    /// Nested call beyond 1024 frames
    #[error("call depth exceeded (max 1024)")]
    CallDepthExceeded,

    /// Precompile rejected its input
    #[error("precompile failure: {0}")]
    PrecompileFailure(&'static str),
}

/// Errors returned by engine entry points.
///
/// Inside the interpreter, `Halt` carries an exceptional halt up to the step
/// loop, which turns it into a frame result. The other variants are hard
/// failures that abort the whole call tree after every open checkpoint has
/// been reverted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvmError {
    /// Exceptional halt of the current frame
    #[error(transparent)]
    Halt(#[from] ExceptionalHalt),

    /// State backend failure
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Execution was interrupted or timed out
    #[error("execution cancelled")]
    Cancelled,

    /// Top-level message deeper than the call depth limit
    #[error("call depth {0} exceeds limit")]
    DepthExceeded(usize),

    /// Malformed top-level message
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Result type for engine operations
pub type EvmResult<T> = Result<T, EvmError>;
