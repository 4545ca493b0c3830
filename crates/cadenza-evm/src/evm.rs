//! Call and create protocol
//!
//! [`Evm`] owns the state view for one call tree and implements [`Host`], so
//! every CALL* or CREATE* opcode re-enters [`Evm::execute_message`]. Each frame
//! opens its own checkpoint and closes it before returning, on every path.

use crate::analysis::JumpDests;
use crate::config::EvmConfig;
use crate::context::Environment;
use crate::error::{EvmError, EvmResult, ExceptionalHalt};
use crate::gas::cost;
use crate::hardfork::Ruleset;
use crate::host::Host;
use crate::interpreter::{self, RunState};
use crate::interrupt::InterruptHandle;
use crate::message::Message;
use crate::precompiles::Precompiles;
use crate::result::ExecResult;
use crate::table::JumpTable;
use crate::tracer::{StepEvent, Tracer};
use bytes::Bytes;
use cadenza_crypto::keccak256;
use cadenza_primitives::{Address, H256, U256};
use cadenza_state::{Checkpoint, StateAccess, StateError};
use rlp::RlpStream;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Address of a contract created with CREATE: `keccak256(rlp([sender, nonce]))[12..]`
pub fn create_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(sender);
    stream.append(&nonce);
    Address::from_word(keccak256(&stream.out()).to_word())
}

/// Address of a contract created with CREATE2:
/// `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]`
pub fn create2_address(sender: &Address, salt: &H256, init_code: &[u8]) -> Address {
    let code_hash = keccak256(init_code);
    let mut data = Vec::with_capacity(1 + 20 + 32 + 32);
    data.push(0xff);
    data.extend_from_slice(sender.as_bytes());
    data.extend_from_slice(salt.as_bytes());
    data.extend_from_slice(code_hash.as_bytes());
    Address::from_word(keccak256(&data).to_word())
}

/// Execution engine for one state view.
///
/// A single `Evm` runs call trees one after another; independent trees may
/// run on separate threads as long as each owns its own state.
pub struct Evm<S: StateAccess> {
    state: S,
    env: Environment,
    config: EvmConfig,
    rules: Ruleset,
    table: Arc<JumpTable>,
    precompiles: Precompiles,
    analysis: HashMap<H256, Arc<JumpDests>>,
    tracer: Option<Box<dyn Tracer>>,
    interrupt: InterruptHandle,
    deadline: Option<Instant>,
}

impl<S: StateAccess> Evm<S> {
    /// Engine over `state` with the rules selected by `config`
    pub fn new(state: S, env: Environment, config: EvmConfig) -> Self {
        let rules = config.ruleset();
        Self {
            table: Arc::new(JumpTable::new(&rules)),
            precompiles: Precompiles::new(&rules),
            state,
            env,
            config,
            rules,
            analysis: HashMap::new(),
            tracer: None,
            interrupt: InterruptHandle::new(),
            deadline: None,
        }
    }

    /// Attach a tracer
    pub fn with_tracer(mut self, tracer: Box<dyn Tracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Replace or remove the tracer
    pub fn set_tracer(&mut self, tracer: Option<Box<dyn Tracer>>) {
        self.tracer = tracer;
    }

    /// Handle that cancels the running call tree from another thread
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// World state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// World state, mutably
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Give the state back
    pub fn into_state(self) -> S {
        self.state
    }

    /// Active precompiles
    pub fn precompiles(&self) -> &Precompiles {
        &self.precompiles
    }

    /// Run a top-level message.
    ///
    /// A message that fails validation is rejected before any checkpoint is
    /// opened. On `Err` every checkpoint opened by the call tree has already
    /// been reverted.
    pub fn run_call(&mut self, message: &Message) -> EvmResult<ExecResult> {
        message.validate()?;
        self.deadline = self.config.timeout().map(|timeout| Instant::now() + timeout);
        if message.depth == 0 {
            self.state.begin_transaction()?;
            self.warm_transaction_addresses(message);
        }

        debug!(
            kind = ?message.kind,
            caller = %message.caller,
            gas_limit = message.gas_limit,
            "run call"
        );
        let outcome = self.execute_message(message);
        self.deadline = None;

        match &outcome {
            Ok(result) => debug!(
                status = ?result.status,
                gas_used = result.gas_used,
                "call finished"
            ),
            Err(err) => warn!(%err, "call aborted"),
        }
        outcome
    }

    /// Addresses warm from the start of a transaction (EIP-2929, EIP-3651)
    fn warm_transaction_addresses(&mut self, message: &Message) {
        if !self.rules.is_activated(2929) {
            return;
        }
        self.state.mark_warm_address(message.caller);
        if let Some(to) = message.to {
            self.state.mark_warm_address(to);
        }
        if let Some(code_address) = message.code_address() {
            self.state.mark_warm_address(code_address);
        }
        for address in self.precompiles.addresses() {
            self.state.mark_warm_address(address);
        }
        if self.rules.is_activated(3651) {
            self.state.mark_warm_address(self.env.block.coinbase);
        }
    }

    fn execute_message(&mut self, message: &Message) -> EvmResult<ExecResult> {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.on_enter(message);
        }
        trace!(depth = message.depth, kind = ?message.kind, gas = message.gas_limit, "enter frame");

        let result = if message.is_create() {
            self.execute_create(message)?
        } else {
            self.execute_call(message)?
        };

        trace!(depth = message.depth, status = ?result.status, gas_used = result.gas_used, "exit frame");
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.on_exit(message.depth, &result);
        }
        Ok(result)
    }

    fn execute_call(&mut self, message: &Message) -> EvmResult<ExecResult> {
        let checkpoint = self.state.checkpoint();
        let outcome = self.call_frame(message);
        self.settle(checkpoint, outcome)
    }

    fn execute_create(&mut self, message: &Message) -> EvmResult<ExecResult> {
        let limit = message.gas_limit;
        let limit_initcode =
            self.rules.is_activated(3860) && !self.config.allow_unlimited_initcode_size;
        if limit_initcode && message.data.len() > cost::MAX_INIT_CODE_SIZE {
            return Ok(failed(ExceptionalHalt::InitcodeSizeViolation, message));
        }

        // the sender nonce moves in the parent's scope and survives a failed creation
        let nonce = match self.state.increment_nonce(message.caller) {
            Ok(nonce) => nonce,
            Err(StateError::NonceOverflow(_)) => {
                return Ok(failed(ExceptionalHalt::ValueOverflow, message));
            }
            Err(err) => return Err(err.into()),
        };
        let address = match message.salt {
            Some(salt) => create2_address(&message.caller, &salt, &message.data),
            None => create_address(&message.caller, nonce),
        };
        if self.rules.is_activated(2929) {
            self.state.mark_warm_address(address);
        }
        debug!(%address, depth = message.depth, gas_limit = limit, "create");

        let checkpoint = self.state.checkpoint();
        let outcome = self.create_frame(message, address);
        self.settle(checkpoint, outcome)
    }

    /// Close `checkpoint` according to the frame outcome
    fn settle(&mut self, checkpoint: Checkpoint, outcome: EvmResult<ExecResult>) -> EvmResult<ExecResult> {
        let depth = checkpoint.depth();
        match outcome {
            Ok(result) if result.is_success() => {
                trace!(depth, "commit checkpoint");
                self.state.commit(checkpoint)?;
                Ok(result)
            }
            Ok(result) => {
                trace!(depth, status = ?result.status, "revert checkpoint");
                self.state.revert(checkpoint)?;
                Ok(result)
            }
            Err(err) => {
                if let Err(revert_err) = self.state.revert(checkpoint) {
                    warn!(%revert_err, depth, "checkpoint revert failed while unwinding");
                }
                debug!(%err, depth, "frame aborted");
                Err(err)
            }
        }
    }

    fn call_frame(&mut self, message: &Message) -> EvmResult<ExecResult> {
        let limit = message.gas_limit;
        let to = message
            .to
            .ok_or_else(|| EvmError::InvalidMessage("call without recipient".into()))?;

        if !message.delegatecall {
            if let Some(halt) =
                self.transfer(message.caller, to, message.value, message.skip_balance)?
            {
                return Ok(failed(halt, message));
            }
        }

        let code_address = message.code_address().unwrap_or(to);
        let code = match &message.code {
            Some(code) => code.clone(),
            None => {
                if let Some(outcome) = self.precompiles.run(&code_address, &message.data, limit) {
                    return Ok(match outcome {
                        Ok(output) => {
                            ExecResult::success(limit, limit - output.gas_used, output.output)
                                .with_refund(message.gas_refund)
                        }
                        Err(err) => {
                            debug!(address = %code_address, %err, "precompile failed");
                            failed(err.into(), message)
                        }
                    });
                }
                self.state.get_code(&code_address)?
            }
        };

        if code.is_empty() {
            return Ok(ExecResult::success(limit, limit, Bytes::new()).with_refund(message.gas_refund));
        }
        self.run_code(message, to, code)
    }

    fn create_frame(&mut self, message: &Message, address: Address) -> EvmResult<ExecResult> {
        if self.state.get_nonce(&address)? > 0 || !self.state.get_code(&address)?.is_empty() {
            debug!(%address, "create collision");
            return Ok(failed(ExceptionalHalt::CreateCollision, message));
        }

        // EIP-161: new contracts start at nonce 1, keeping any pre-funded balance
        let mut account = self.state.get_account(&address)?.unwrap_or_default();
        account.nonce = 1;
        self.state.put_account(address, account)?;

        if let Some(halt) =
            self.transfer(message.caller, address, message.value, message.skip_balance)?
        {
            return Ok(failed(halt, message));
        }

        let mut result = if message.data.is_empty() {
            ExecResult::success(message.gas_limit, message.gas_limit, Bytes::new())
                .with_refund(message.gas_refund)
        } else {
            self.run_code(message, address, message.data.clone())?
        };
        if !result.is_success() {
            return Ok(result);
        }

        let code = std::mem::take(&mut result.output);
        if !self.config.allow_unlimited_contract_size && code.len() > cost::MAX_CODE_SIZE {
            return Ok(failed(ExceptionalHalt::CodeSizeExceedsMaximum, message));
        }
        if self.rules.is_activated(3541) && code.first() == Some(&0xef) {
            return Ok(failed(ExceptionalHalt::InvalidCodePrefix, message));
        }
        let deposit = cost::CODE_DEPOSIT.saturating_mul(code.len() as u64);
        if deposit > result.gas_left {
            return Ok(failed(ExceptionalHalt::OutOfGas, message));
        }
        result.gas_left -= deposit;
        result.gas_used += deposit;

        if !code.is_empty() {
            self.state.put_code(address, code)?;
        }
        result.created_address = Some(address);
        Ok(result)
    }

    /// Move `value` from `from` to `to`.
    ///
    /// Returns the halt to report when the transfer cannot happen. With
    /// `skip_balance` the shortfall is minted first.
    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        skip_balance: bool,
    ) -> EvmResult<Option<ExceptionalHalt>> {
        if value.is_zero() {
            return Ok(None);
        }
        let balance = self.state.get_balance(&from)?;
        if balance < value {
            if !skip_balance {
                trace!(%from, %value, %balance, "insufficient balance for transfer");
                return Ok(Some(ExceptionalHalt::InsufficientBalance));
            }
            self.state.add_balance(from, value - balance)?;
        }
        self.state.sub_balance(from, value)?;
        match self.state.add_balance(to, value) {
            Ok(()) => Ok(None),
            Err(StateError::BalanceOverflow(_)) => Ok(Some(ExceptionalHalt::ValueOverflow)),
            Err(err) => Err(err.into()),
        }
    }

    fn run_code(&mut self, message: &Message, address: Address, code: Bytes) -> EvmResult<ExecResult> {
        let jumpdests = self.jumpdests(&code);
        let table = Arc::clone(&self.table);
        let mut run_state = RunState::new(message, address, code, jumpdests);
        let status = interpreter::run(&table, &mut run_state, self)?;
        Ok(run_state.into_result(status))
    }

    /// Jump destination analysis, cached by code hash
    fn jumpdests(&mut self, code: &[u8]) -> Arc<JumpDests> {
        let hash = keccak256(code);
        Arc::clone(
            self.analysis
                .entry(hash)
                .or_insert_with(|| Arc::new(JumpDests::analyze(code))),
        )
    }
}

/// Exceptional result for `message`, keeping the inherited refund counter
fn failed(halt: ExceptionalHalt, message: &Message) -> ExecResult {
    ExecResult::exception(halt, message.gas_limit).with_refund(message.gas_refund)
}

impl<S: StateAccess> Host for Evm<S> {
    fn env(&self) -> &Environment {
        &self.env
    }

    fn ruleset(&self) -> &Ruleset {
        &self.rules
    }

    fn config(&self) -> &EvmConfig {
        &self.config
    }

    fn state(&mut self) -> &mut dyn StateAccess {
        &mut self.state
    }

    fn is_precompile(&self, address: &Address) -> bool {
        self.precompiles.contains(address)
    }

    fn call(&mut self, message: &Message) -> EvmResult<ExecResult> {
        if message.depth > cost::MAX_CALL_DEPTH {
            return Ok(failed(ExceptionalHalt::CallDepthExceeded, message));
        }
        self.execute_message(message)
    }

    fn step(&mut self, event: &StepEvent) {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.on_step(event);
        }
    }

    fn tracing(&self) -> bool {
        self.tracer.is_some()
    }

    fn interrupted(&self) -> bool {
        self.interrupt.is_interrupted()
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
