//! Call and create requests

use crate::error::{EvmError, EvmResult};
use crate::gas::cost::MAX_CALL_DEPTH;
use bytes::Bytes;
use cadenza_primitives::{Address, H256, U256};
use serde::Serialize;

/// How a frame was entered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallKind {
    /// Plain message call
    Call,
    /// CALLCODE: callee code in the caller's context
    CallCode,
    /// DELEGATECALL: callee code with the caller's context and value
    DelegateCall,
    /// STATICCALL: read-only call
    StaticCall,
    /// CREATE
    Create,
    /// CREATE2
    Create2,
}

impl CallKind {
    /// Whether this kind deploys a contract
    pub fn is_create(self) -> bool {
        matches!(self, CallKind::Create | CallKind::Create2)
    }
}

/// One call or contract-creation request.
///
/// Built once by the caller and passed by reference; the engine never mutates
/// a message after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Frame kind
    pub kind: CallKind,
    /// Recipient; `None` for contract creation
    pub to: Option<Address>,
    /// Sender
    pub caller: Address,
    /// Value transferred (or, for DELEGATECALL, the inherited call value)
    pub value: U256,
    /// Gas given to the frame
    pub gas_limit: u64,
    /// Call data, or init code for creation
    pub data: Bytes,
    /// Code to run instead of the code stored at `code_address`
    pub code: Option<Bytes>,
    /// Account whose code runs; defaults to `to`
    pub code_address: Option<Address>,
    /// Call depth, 0 for the top-level message
    pub depth: usize,
    /// Read-only context
    pub is_static: bool,
    /// Target resolved to a precompile
    pub is_compiled: bool,
    /// CREATE2 salt
    pub salt: Option<H256>,
    /// Run in the caller's context without transferring value
    pub delegatecall: bool,
    /// Refund counter inherited from the parent frame
    pub gas_refund: u64,
    /// Skip the sender balance check on value transfer (simulation)
    pub skip_balance: bool,
}

impl Message {
    /// Message call from `caller` to `to`
    pub fn call(caller: Address, to: Address, value: U256, gas_limit: u64, data: Bytes) -> Self {
        Self {
            kind: CallKind::Call,
            to: Some(to),
            caller,
            value,
            gas_limit,
            data,
            code: None,
            code_address: Some(to),
            depth: 0,
            is_static: false,
            is_compiled: false,
            salt: None,
            delegatecall: false,
            gas_refund: 0,
            skip_balance: false,
        }
    }

    /// Contract creation running `init_code`
    pub fn create(caller: Address, value: U256, gas_limit: u64, init_code: Bytes) -> Self {
        Self {
            kind: CallKind::Create,
            to: None,
            caller,
            value,
            gas_limit,
            data: init_code,
            code: None,
            code_address: None,
            depth: 0,
            is_static: false,
            is_compiled: false,
            salt: None,
            delegatecall: false,
            gas_refund: 0,
            skip_balance: false,
        }
    }

    /// Set the frame kind
    pub fn with_kind(mut self, kind: CallKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set call depth
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Mark read-only
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Run `code` instead of the stored code
    pub fn with_code(mut self, code: Bytes) -> Self {
        self.code = Some(code);
        self
    }

    /// Run the code stored at `address`
    pub fn with_code_address(mut self, address: Address) -> Self {
        self.code_address = Some(address);
        self
    }

    /// CREATE2 with `salt`
    pub fn with_salt(mut self, salt: H256) -> Self {
        self.kind = CallKind::Create2;
        self.salt = Some(salt);
        self
    }

    /// Keep the caller's context and skip the value transfer
    pub fn with_delegatecall(mut self) -> Self {
        self.kind = CallKind::DelegateCall;
        self.delegatecall = true;
        self
    }

    /// Inherit a refund counter
    pub fn with_gas_refund(mut self, refund: u64) -> Self {
        self.gas_refund = refund;
        self
    }

    /// Skip the sender balance check
    pub fn with_skip_balance(mut self, skip: bool) -> Self {
        self.skip_balance = skip;
        self
    }

    /// Whether this message deploys a contract
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Account whose code runs
    pub fn code_address(&self) -> Option<Address> {
        self.code_address.or(self.to)
    }

    /// Reject messages whose fields contradict each other
    pub fn validate(&self) -> EvmResult<()> {
        if self.depth > MAX_CALL_DEPTH {
            return Err(EvmError::DepthExceeded(self.depth));
        }
        if self.is_create() {
            if self.delegatecall {
                return Err(EvmError::InvalidMessage(
                    "creation cannot be a delegate call".into(),
                ));
            }
            if self.is_static {
                return Err(EvmError::InvalidMessage(
                    "creation in a static context".into(),
                ));
            }
        } else if self.salt.is_some() {
            return Err(EvmError::InvalidMessage("salt without creation".into()));
        }
        if self.is_static && self.kind == CallKind::Call && !self.value.is_zero() {
            return Err(EvmError::InvalidMessage(
                "value transfer in a static context".into(),
            ));
        }
        Ok(())
    }
}
