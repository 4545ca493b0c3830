//! # cadenza-evm-tests
//!
//! Declarative test vectors for the Cadenza EVM.
//!
//! This crate provides:
//! - JSON parsing for the fixture format
//! - A runner that seeds a `MemoryState`, executes one message and checks the outcome
//! - Result aggregation and reporting
//!
//! ## Fixture format
//!
//! A fixture file maps test names to objects with these keys:
//! - `config`: optional `EvmConfig` (hardfork, extra EIPs, ...)
//! - `env`: block and transaction context
//! - `pre`: accounts with balance, nonce, code and storage
//! - `exec`: the message; omit `to` for contract creation
//! - `expect`: status, and optionally gas used, output, storage and balances

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod runner;
mod types;

pub use error::{TestError, TestResult};
pub use runner::{FixtureResults, FixtureRunner, FixtureStats};
pub use types::*;
