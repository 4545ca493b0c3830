//! CREATE, the CALL family and SELFDESTRUCT.
//!
//! These opcodes build a child [`Message`] and hand it back to the host,
//! which runs the full call protocol and returns the child's result.

use crate::error::{EvmResult, ExceptionalHalt};
use crate::gas::{self, cost};
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use crate::message::{CallKind, Message};
use crate::opcode::Opcode;
use crate::result::ExitStatus;
use bytes::Bytes;
use cadenza_primitives::{Address, H256, U256};
use tracing::trace;

/// Read `(offset, size)` from memory; the range was paid for already
fn read_input(state: &mut RunState<'_>, offset: U256, size: U256) -> Result<Bytes, ExceptionalHalt> {
    Ok(match state.touch_memory(offset, size)? {
        Some((offset, size)) => Bytes::from(state.memory.read(offset, size)),
        None => Bytes::new(),
    })
}

fn flag(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

pub(super) fn create(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let [value, offset, size] = state.stack.pop_n()?;
    let salt = if state.opcode == Opcode::CREATE2 {
        Some(H256::from_word(state.stack.pop()?))
    } else {
        None
    };
    let init_code = read_input(state, offset, size)?;
    state.return_data = Bytes::new();

    let depth = state.message.depth;
    if depth >= cost::MAX_CALL_DEPTH || host.state().get_balance(&state.address)? < value {
        trace!(depth, "create refused before running init code");
        state.stack.push(U256::zero())?;
        return Ok(Control::Continue);
    }

    let gas = gas::all_but_one_64th(state.gas.left());
    state.gas.use_gas(gas, state.opcode.name())?;

    let mut message = Message::create(state.address, value, gas, init_code)
        .with_depth(depth + 1)
        .with_gas_refund(state.gas.refund());
    if let Some(salt) = salt {
        message = message.with_salt(salt);
    }

    let result = host.call(&message)?;
    state.gas.return_gas(result.gas_left);
    match result.status {
        ExitStatus::Success => {
            state.absorb(&result);
            let created = result.created_address.unwrap_or(Address::ZERO);
            state.stack.push(created.to_word())?;
        }
        ExitStatus::Revert => {
            state.return_data = result.output;
            state.stack.push(U256::zero())?;
        }
        ExitStatus::Exception(_) => state.stack.push(U256::zero())?,
    }
    Ok(Control::Continue)
}

pub(super) fn call(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let opcode = state.opcode;
    let requested = state.stack.pop()?;
    let target = Address::from_word(state.stack.pop()?);
    let value = match opcode {
        Opcode::CALL | Opcode::CALLCODE => state.stack.pop()?,
        _ => U256::zero(),
    };
    let [in_offset, in_size, out_offset, out_size] = state.stack.pop_n()?;

    if opcode == Opcode::CALL && state.message.is_static && !value.is_zero() {
        return Err(ExceptionalHalt::StaticStateChange.into());
    }

    let input = read_input(state, in_offset, in_size)?;
    let out_range = state.touch_memory(out_offset, out_size)?;
    state.return_data = Bytes::new();

    let mut gas = gas::call_gas(requested, state.gas.left());
    state.gas.use_gas(gas, opcode.name())?;
    if !value.is_zero() {
        gas += cost::CALL_STIPEND;
    }

    let depth = state.message.depth;
    let unfunded = !value.is_zero() && host.state().get_balance(&state.address)? < value;
    if depth >= cost::MAX_CALL_DEPTH || unfunded {
        trace!(depth, unfunded, "call refused before entering callee");
        state.gas.return_gas(gas);
        state.stack.push(U256::zero())?;
        return Ok(Control::Continue);
    }

    let parent = state.message;
    let message = match opcode {
        Opcode::CALL => Message::call(state.address, target, value, gas, input),
        Opcode::CALLCODE => Message::call(state.address, state.address, value, gas, input)
            .with_kind(CallKind::CallCode)
            .with_code_address(target),
        Opcode::DELEGATECALL => Message::call(parent.caller, state.address, parent.value, gas, input)
            .with_code_address(target)
            .with_delegatecall(),
        _ => Message::call(state.address, target, U256::zero(), gas, input)
            .with_kind(CallKind::StaticCall),
    };
    let message = message
        .with_depth(depth + 1)
        .with_gas_refund(state.gas.refund())
        .with_static(parent.is_static || opcode == Opcode::STATICCALL);

    let result = host.call(&message)?;
    state.gas.return_gas(result.gas_left);

    if let Some((offset, size)) = out_range {
        let copied = size.min(result.output.len());
        state.memory.write(offset, copied, &result.output[..copied]);
    }
    let success = result.is_success();
    if success {
        state.absorb(&result);
    }
    state.return_data = result.output;
    state.stack.push(flag(success))?;
    Ok(Control::Continue)
}

/// Record the request; the balance moves and the account goes away when the
/// transaction settles.
pub(super) fn selfdestruct(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let beneficiary = Address::from_word(state.stack.pop()?);
    let refunds = !host.ruleset().is_activated(3529);
    let first = state
        .selfdestructs
        .insert(state.address, beneficiary)
        .is_none();
    if refunds && first {
        state.gas.refund_gas(cost::SELFDESTRUCT_REFUND);
    }
    Ok(Control::Stop)
}
