//! Memory opcodes and KECCAK256

use crate::error::EvmResult;
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use cadenza_crypto::keccak256 as hash;
use cadenza_primitives::U256;

pub(super) fn mload(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let offset = state.stack.pop()?;
    let value = match state.touch_memory(offset, U256::from(32))? {
        Some((offset, _)) => state.memory.load_word(offset),
        None => U256::zero(),
    };
    state.stack.push(value)?;
    Ok(Control::Continue)
}

pub(super) fn mstore(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [offset, value] = state.stack.pop_n()?;
    if let Some((offset, _)) = state.touch_memory(offset, U256::from(32))? {
        state.memory.store_word(offset, value);
    }
    Ok(Control::Continue)
}

pub(super) fn mstore8(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [offset, value] = state.stack.pop_n()?;
    if let Some((offset, _)) = state.touch_memory(offset, U256::one())? {
        state.memory.store_byte(offset, value.byte(0));
    }
    Ok(Control::Continue)
}

pub(super) fn msize(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(state.memory.len()))?;
    Ok(Control::Continue)
}

pub(super) fn mcopy(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [dest, src, size] = state.stack.pop_n()?;
    let Some((dest, size)) = state.touch_memory(dest, size)? else {
        return Ok(Control::Continue);
    };
    // the source range was priced together with the destination
    if let Some((src, _)) = state.touch_memory(src, U256::from(size))? {
        state.memory.copy_within(dest, src, size);
    }
    Ok(Control::Continue)
}

pub(super) fn keccak256(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [offset, size] = state.stack.pop_n()?;
    let digest = match state.touch_memory(offset, size)? {
        Some((offset, size)) => hash(&state.memory.read(offset, size)),
        None => hash(&[]),
    };
    state.stack.push(digest.to_word())?;
    Ok(Control::Continue)
}
