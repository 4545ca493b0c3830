//! EVM bytecode interpreter

use crate::analysis::JumpDests;
use crate::error::{EvmError, EvmResult, ExceptionalHalt};
use crate::gas;
use crate::host::Host;
use crate::memory::Memory;
use crate::message::Message;
use crate::meter::GasMeter;
use crate::opcode::Opcode;
use crate::result::{ExecResult, ExitStatus, Log};
use crate::stack::Stack;
use crate::table::JumpTable;
use crate::tracer::StepEvent;
use bytes::Bytes;
use cadenza_primitives::{Address, U256};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What the loop does after an opcode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// Advance to the next opcode
    Continue,
    /// The handler already set `pc`
    Jump,
    /// Halt normally (STOP, RETURN, SELFDESTRUCT)
    Stop,
    /// Halt with REVERT
    Revert,
}

/// Mutable context of one interpreter invocation
#[derive(Debug)]
pub struct RunState<'a> {
    /// Program counter
    pub pc: usize,
    /// Opcode being executed
    pub opcode: Opcode,
    /// Word stack
    pub stack: Stack,
    /// Linear memory
    pub memory: Memory,
    /// Gas meter
    pub gas: GasMeter,
    /// The message that started this frame
    pub message: &'a Message,
    /// Account whose storage and balance the code acts on
    pub address: Address,
    /// Code being run
    pub code: Bytes,
    /// Valid jump destinations of `code`
    pub jumpdests: Arc<JumpDests>,
    /// Output of the most recent sub-call
    pub return_data: Bytes,
    /// Frame output (RETURN or REVERT data)
    pub output: Bytes,
    /// Logs emitted by this frame and its successful children
    pub logs: Vec<Log>,
    /// Self-destruct requests of this frame and its successful children
    pub selfdestructs: BTreeMap<Address, Address>,
}

impl<'a> RunState<'a> {
    /// Fresh state for running `code` on behalf of `message`
    pub fn new(message: &'a Message, address: Address, code: Bytes, jumpdests: Arc<JumpDests>) -> Self {
        Self {
            pc: 0,
            opcode: Opcode::STOP,
            stack: Stack::new(),
            memory: Memory::new(),
            gas: GasMeter::new(message.gas_limit, message.gas_refund),
            message,
            address,
            code,
            jumpdests,
            return_data: Bytes::new(),
            output: Bytes::new(),
            logs: Vec::new(),
            selfdestructs: BTreeMap::new(),
        }
    }

    /// Validate and grow memory for a stack `(offset, size)` pair whose
    /// expansion has already been paid for
    pub fn touch_memory(
        &mut self,
        offset: U256,
        size: U256,
    ) -> Result<Option<(usize, usize)>, ExceptionalHalt> {
        let range = gas::memory_range(offset, size)?;
        if let Some((offset, size)) = range {
            self.memory.extend(offset, size);
        }
        Ok(range)
    }

    /// Move `pc` to `dest` if it is a JUMPDEST
    pub fn jump(&mut self, dest: U256) -> Result<(), ExceptionalHalt> {
        let target = cadenza_primitives::word_to_usize(&dest)
            .filter(|pc| self.jumpdests.is_valid(*pc))
            .ok_or(ExceptionalHalt::InvalidJump(
                cadenza_primitives::word_to_u64_saturating(&dest) as usize,
            ))?;
        self.pc = target;
        Ok(())
    }

    /// Fold a successful child frame into this one
    pub fn absorb(&mut self, child: &ExecResult) {
        self.gas.adopt_refund(child.gas_refund);
        self.logs.extend(child.logs.iter().cloned());
        self.selfdestructs
            .extend(child.selfdestructs.iter().map(|(a, b)| (*a, *b)));
    }

    fn step_event(&self, gas_cost: u64) -> StepEvent {
        StepEvent {
            depth: self.message.depth,
            pc: self.pc,
            opcode: self.opcode.byte(),
            op_name: self.opcode.name(),
            gas_left: self.gas.left(),
            gas_cost,
            stack: self.stack.as_slice().to_vec(),
            memory_size: self.memory.len(),
        }
    }

    /// Turn the final state into a frame result
    pub fn into_result(self, status: ExitStatus) -> ExecResult {
        let limit = self.gas.limit();
        let inherited = self.message.gas_refund;
        match status {
            ExitStatus::Success => ExecResult {
                status,
                gas_used: self.gas.spent(),
                gas_left: self.gas.left(),
                gas_refund: self.gas.refund(),
                output: self.output,
                logs: self.logs,
                selfdestructs: self.selfdestructs,
                created_address: None,
            },
            ExitStatus::Revert => {
                ExecResult::revert(limit, self.gas.left(), self.output).with_refund(inherited)
            }
            ExitStatus::Exception(halt) => ExecResult::exception(halt, limit).with_refund(inherited),
        }
    }
}

/// Run the fetch-decode-execute loop until the frame halts.
///
/// Exceptional halts come back as `Ok(ExitStatus::Exception(_))` with no gas
/// left; `Err` is reserved for cancellation and state backend failures.
pub fn run(table: &JumpTable, state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<ExitStatus> {
    loop {
        if host.interrupted() {
            return Err(EvmError::Cancelled);
        }
        match step(table, state, host) {
            Ok(Control::Continue) => state.pc += 1,
            Ok(Control::Jump) => {}
            Ok(Control::Stop) => return Ok(ExitStatus::Success),
            Ok(Control::Revert) => return Ok(ExitStatus::Revert),
            Err(EvmError::Halt(halt)) => {
                state.gas.exhaust();
                return Ok(ExitStatus::Exception(halt));
            }
            Err(err) => return Err(err),
        }
    }
}

#[inline]
fn step(table: &JumpTable, state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    // running off the end is an implicit STOP
    let Some(&byte) = state.code.get(state.pc) else {
        return Ok(Control::Stop);
    };
    let info = table
        .get(byte)
        .ok_or(ExceptionalHalt::InvalidOpcode(byte))?;
    state.opcode = info.opcode;

    if host.tracing() {
        host.step(&state.step_event(info.static_gas));
    }

    if state.message.is_static && info.opcode.writes_state() {
        return Err(ExceptionalHalt::StaticStateChange.into());
    }

    state.gas.use_gas(info.static_gas, info.opcode.name())?;
    if let Some(dynamic) = info.dynamic {
        let cost = dynamic(state, host)?;
        state.gas.use_gas(cost, info.opcode.name())?;
    }
    (info.handler)(state, host)
}
