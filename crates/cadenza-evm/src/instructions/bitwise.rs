//! Comparison and bitwise opcodes

use crate::error::EvmResult;
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use crate::word;
use cadenza_primitives::U256;

#[inline]
fn flag(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

pub(super) fn lt(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(flag(a < b))?;
    Ok(Control::Continue)
}

pub(super) fn gt(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(flag(a > b))?;
    Ok(Control::Continue)
}

pub(super) fn slt(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(flag(word::slt(&a, &b)))?;
    Ok(Control::Continue)
}

pub(super) fn sgt(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(flag(word::sgt(&a, &b)))?;
    Ok(Control::Continue)
}

pub(super) fn eq(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(flag(a == b))?;
    Ok(Control::Continue)
}

pub(super) fn iszero(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let a = state.stack.pop()?;
    state.stack.push(flag(a.is_zero()))?;
    Ok(Control::Continue)
}

pub(super) fn and(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(a & b)?;
    Ok(Control::Continue)
}

pub(super) fn or(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(a | b)?;
    Ok(Control::Continue)
}

pub(super) fn xor(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(a ^ b)?;
    Ok(Control::Continue)
}

pub(super) fn not(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let a = state.stack.pop()?;
    state.stack.push(!a)?;
    Ok(Control::Continue)
}

pub(super) fn byte(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [i, x] = state.stack.pop_n()?;
    state.stack.push(word::byte(i, x))?;
    Ok(Control::Continue)
}

pub(super) fn shl(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [shift, value] = state.stack.pop_n()?;
    state.stack.push(word::shl(shift, value))?;
    Ok(Control::Continue)
}

pub(super) fn shr(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [shift, value] = state.stack.pop_n()?;
    state.stack.push(word::shr(shift, value))?;
    Ok(Control::Continue)
}

pub(super) fn sar(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [shift, value] = state.stack.pop_n()?;
    state.stack.push(word::sar(shift, value))?;
    Ok(Control::Continue)
}
