//! # cadenza-evm
//!
//! EVM bytecode execution engine.
//!
//! This crate provides:
//! - Word stack, linear memory and gas meter
//! - Per-ruleset opcode dispatch table and the interpreter loop
//! - The call/create protocol with per-frame checkpoints ([`Evm`])
//! - Precompiled contracts from ecrecover to BLS12-381
//! - Step tracing hooks and cooperative cancellation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod context;
mod dynamic;
pub mod error;
pub mod evm;
pub mod gas;
pub mod hardfork;
pub mod host;
mod instructions;
pub mod interpreter;
pub mod interrupt;
pub mod memory;
pub mod message;
pub mod meter;
pub mod opcode;
pub mod precompiles;
pub mod result;
pub mod stack;
pub mod table;
pub mod tracer;
mod word;

pub use config::EvmConfig;
pub use context::{BlockContext, Environment, TxContext};
pub use error::{EvmError, EvmResult, ExceptionalHalt};
pub use evm::{create2_address, create_address, Evm};
pub use hardfork::{Hardfork, Ruleset};
pub use host::Host;
pub use interrupt::InterruptHandle;
pub use message::{CallKind, Message};
pub use precompiles::{PrecompileError, Precompiles};
pub use result::{ExecResult, ExitStatus, Log};
pub use tracer::{CollectingTracer, FrameEvent, JsonTracer, StepEvent, Tracer};
