//! Arithmetic opcodes

use crate::error::EvmResult;
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use crate::word;
use cadenza_primitives::U256;

pub(super) fn add(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(a.overflowing_add(b).0)?;
    Ok(Control::Continue)
}

pub(super) fn mul(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(a.overflowing_mul(b).0)?;
    Ok(Control::Continue)
}

pub(super) fn sub(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(a.overflowing_sub(b).0)?;
    Ok(Control::Continue)
}

pub(super) fn div(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    let quotient = if b.is_zero() { U256::zero() } else { a / b };
    state.stack.push(quotient)?;
    Ok(Control::Continue)
}

pub(super) fn sdiv(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(word::sdiv(a, b))?;
    Ok(Control::Continue)
}

pub(super) fn rem(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    let remainder = if b.is_zero() { U256::zero() } else { a % b };
    state.stack.push(remainder)?;
    Ok(Control::Continue)
}

pub(super) fn smod(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b] = state.stack.pop_n()?;
    state.stack.push(word::smod(a, b))?;
    Ok(Control::Continue)
}

pub(super) fn addmod(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b, n] = state.stack.pop_n()?;
    state.stack.push(word::addmod(a, b, n))?;
    Ok(Control::Continue)
}

pub(super) fn mulmod(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [a, b, n] = state.stack.pop_n()?;
    state.stack.push(word::mulmod(a, b, n))?;
    Ok(Control::Continue)
}

pub(super) fn exp(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [base, exponent] = state.stack.pop_n()?;
    state.stack.push(word::exp(base, exponent))?;
    Ok(Control::Continue)
}

pub(super) fn signextend(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [b, x] = state.stack.pop_n()?;
    state.stack.push(word::signextend(b, x))?;
    Ok(Control::Continue)
}
