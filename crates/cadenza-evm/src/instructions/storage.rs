//! Persistent and transient storage opcodes

use crate::error::EvmResult;
use crate::gas;
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use cadenza_primitives::H256;

pub(super) fn sload(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let key = H256::from_word(state.stack.pop()?);
    let value = host.state().get_storage(&state.address, &key)?;
    state.stack.push(value.to_word())?;
    Ok(Control::Continue)
}

/// Gas was charged by the dynamic pass; only the refund counter moves here.
pub(super) fn sstore(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let [key, value] = state.stack.pop_n()?;
    let key = H256::from_word(key);
    let new = H256::from_word(value);
    let address = state.address;

    let current = host.state().get_storage(&address, &key)?;
    let original = host.state().get_original_storage(&address, &key)?;
    let charge = gas::sstore_charge(host.ruleset(), &original, &current, &new);
    state.gas.sub_refund(charge.refund_sub)?;
    state.gas.refund_gas(charge.refund_add);

    host.state().put_storage(address, key, new)?;
    Ok(Control::Continue)
}

pub(super) fn tload(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let key = H256::from_word(state.stack.pop()?);
    let value = host.state().get_transient(&state.address, &key);
    state.stack.push(value.to_word())?;
    Ok(Control::Continue)
}

pub(super) fn tstore(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let [key, value] = state.stack.pop_n()?;
    host.state()
        .put_transient(state.address, H256::from_word(key), H256::from_word(value));
    Ok(Control::Continue)
}
