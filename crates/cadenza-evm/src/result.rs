//! Frame results

use crate::error::ExceptionalHalt;
use bytes::Bytes;
use cadenza_primitives::{Address, H256};
use std::collections::BTreeMap;

/// Log entry emitted by LOG0-LOG4
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics (0-4)
    pub topics: Vec<H256>,
    /// Unindexed data
    pub data: Bytes,
}

/// How a frame ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// STOP, RETURN, SELFDESTRUCT or running off the end of the code
    Success,
    /// REVERT: state discarded, unused gas returned, output kept
    Revert,
    /// Exceptional halt: state discarded, all gas consumed
    Exception(ExceptionalHalt),
}

/// Outcome of executing one message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecResult {
    /// How the frame ended
    pub status: ExitStatus,
    /// Gas consumed by the frame (its whole allotment on exception)
    pub gas_used: u64,
    /// Gas handed back to the caller
    pub gas_left: u64,
    /// Refund counter at frame exit, uncapped
    pub gas_refund: u64,
    /// RETURN data, revert reason, or empty
    pub output: Bytes,
    /// Logs emitted by the frame and its successful children
    pub logs: Vec<Log>,
    /// Accounts marked for self-destruct, with their beneficiaries
    pub selfdestructs: BTreeMap<Address, Address>,
    /// Address of the deployed contract for a successful creation
    pub created_address: Option<Address>,
}

impl ExecResult {
    /// Successful result
    pub fn success(gas_limit: u64, gas_left: u64, output: Bytes) -> Self {
        Self {
            status: ExitStatus::Success,
            gas_used: gas_limit - gas_left.min(gas_limit),
            gas_left,
            gas_refund: 0,
            output,
            logs: Vec::new(),
            selfdestructs: BTreeMap::new(),
            created_address: None,
        }
    }

    /// Reverted result keeping `output` as the reason
    pub fn revert(gas_limit: u64, gas_left: u64, output: Bytes) -> Self {
        Self {
            status: ExitStatus::Revert,
            ..Self::success(gas_limit, gas_left, output)
        }
    }

    /// Exceptional halt consuming the whole allotment
    pub fn exception(halt: ExceptionalHalt, gas_limit: u64) -> Self {
        Self {
            status: ExitStatus::Exception(halt),
            ..Self::success(gas_limit, 0, Bytes::new())
        }
    }

    /// Set the refund counter
    pub fn with_refund(mut self, refund: u64) -> Self {
        self.gas_refund = refund;
        self
    }

    /// Frame ended normally
    pub fn is_success(&self) -> bool {
        self.status == ExitStatus::Success
    }

    /// Frame ended with REVERT
    pub fn is_revert(&self) -> bool {
        self.status == ExitStatus::Revert
    }

    /// The exceptional halt, if any
    pub fn exception_kind(&self) -> Option<ExceptionalHalt> {
        match self.status {
            ExitStatus::Exception(halt) => Some(halt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_accounting() {
        let result = ExecResult::success(100, 40, Bytes::from_static(b"ok"));
        assert!(result.is_success());
        assert_eq!(result.gas_used, 60);
        assert_eq!(result.gas_left, 40);
        assert_eq!(result.exception_kind(), None);
    }

    #[test]
    fn test_revert_keeps_output_and_gas() {
        let result = ExecResult::revert(100, 94, Bytes::from_static(b"why"));
        assert!(result.is_revert());
        assert_eq!(result.gas_used, 6);
        assert_eq!(&result.output[..], b"why");
    }

    #[test]
    fn test_exception_consumes_everything() {
        let result = ExecResult::exception(ExceptionalHalt::StackUnderflow, 100).with_refund(7);
        assert_eq!(result.gas_used, 100);
        assert_eq!(result.gas_left, 0);
        assert!(result.output.is_empty());
        assert_eq!(result.gas_refund, 7);
        assert_eq!(result.exception_kind(), Some(ExceptionalHalt::StackUnderflow));
    }
}
