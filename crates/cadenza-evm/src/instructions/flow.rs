//! Control flow and halting opcodes

use crate::error::{EvmResult, ExceptionalHalt};
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use bytes::Bytes;
use cadenza_primitives::U256;

pub(super) fn stop(_state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    Ok(Control::Stop)
}

pub(super) fn jump(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let dest = state.stack.pop()?;
    state.jump(dest)?;
    Ok(Control::Jump)
}

pub(super) fn jumpi(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [dest, condition] = state.stack.pop_n()?;
    if condition.is_zero() {
        return Ok(Control::Continue);
    }
    state.jump(dest)?;
    Ok(Control::Jump)
}

pub(super) fn pc(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(state.pc))?;
    Ok(Control::Continue)
}

pub(super) fn gas(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(state.gas.left()))?;
    Ok(Control::Continue)
}

pub(super) fn jumpdest(_state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    Ok(Control::Continue)
}

/// Read the `(offset, size)` output range into `state.output`
fn set_output(state: &mut RunState<'_>) -> Result<(), ExceptionalHalt> {
    let [offset, size] = state.stack.pop_n()?;
    state.output = match state.touch_memory(offset, size)? {
        Some((offset, size)) => Bytes::from(state.memory.read(offset, size)),
        None => Bytes::new(),
    };
    Ok(())
}

pub(super) fn ret(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    set_output(state)?;
    Ok(Control::Stop)
}

pub(super) fn revert(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    set_output(state)?;
    Ok(Control::Revert)
}

pub(super) fn invalid(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    Err(ExceptionalHalt::InvalidOpcode(state.opcode.byte()).into())
}
