//! Call frame and account environment opcodes

use crate::error::{EvmResult, ExceptionalHalt};
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use cadenza_primitives::{word_to_usize, Address, H256, U256};

/// Bytes of `source` starting at `offset`, at most `size` long; the caller
/// zero-pads whatever falls past the end
fn tail(source: &[u8], offset: U256, size: usize) -> &[u8] {
    let start = word_to_usize(&offset)
        .unwrap_or(usize::MAX)
        .min(source.len());
    let end = start.saturating_add(size).min(source.len());
    &source[start..end]
}

/// Copy `source[offset..offset + size]` into memory at `dest`, zero-padded
fn copy_to_memory(
    state: &mut RunState<'_>,
    source: &[u8],
    dest: U256,
    offset: U256,
    size: U256,
) -> Result<(), ExceptionalHalt> {
    if let Some((dest, size)) = state.touch_memory(dest, size)? {
        state.memory.write(dest, size, tail(source, offset, size));
    }
    Ok(())
}

pub(super) fn address(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(state.address.to_word())?;
    Ok(Control::Continue)
}

pub(super) fn balance(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let address = Address::from_word(state.stack.pop()?);
    let balance = host.state().get_balance(&address)?;
    state.stack.push(balance)?;
    Ok(Control::Continue)
}

pub(super) fn origin(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(host.env().tx.origin.to_word())?;
    Ok(Control::Continue)
}

pub(super) fn caller(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(state.message.caller.to_word())?;
    Ok(Control::Continue)
}

pub(super) fn callvalue(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(state.message.value)?;
    Ok(Control::Continue)
}

pub(super) fn calldataload(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let offset = state.stack.pop()?;
    let mut word = [0u8; 32];
    let bytes = tail(&state.message.data, offset, 32);
    word[..bytes.len()].copy_from_slice(bytes);
    state.stack.push(U256::from_big_endian(&word))?;
    Ok(Control::Continue)
}

pub(super) fn calldatasize(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(state.message.data.len()))?;
    Ok(Control::Continue)
}

pub(super) fn calldatacopy(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [dest, offset, size] = state.stack.pop_n()?;
    let message = state.message;
    copy_to_memory(state, &message.data, dest, offset, size)?;
    Ok(Control::Continue)
}

pub(super) fn codesize(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(state.code.len()))?;
    Ok(Control::Continue)
}

pub(super) fn codecopy(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [dest, offset, size] = state.stack.pop_n()?;
    let code = state.code.clone();
    copy_to_memory(state, &code, dest, offset, size)?;
    Ok(Control::Continue)
}

pub(super) fn gasprice(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(host.env().tx.gas_price)?;
    Ok(Control::Continue)
}

pub(super) fn extcodesize(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let address = Address::from_word(state.stack.pop()?);
    let size = host.state().get_code(&address)?.len();
    state.stack.push(U256::from(size))?;
    Ok(Control::Continue)
}

pub(super) fn extcodecopy(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let [address, dest, offset, size] = state.stack.pop_n()?;
    let code = host.state().get_code(&Address::from_word(address))?;
    copy_to_memory(state, &code, dest, offset, size)?;
    Ok(Control::Continue)
}

pub(super) fn returndatasize(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(state.return_data.len()))?;
    Ok(Control::Continue)
}

pub(super) fn returndatacopy(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [dest, offset, size] = state.stack.pop_n()?;
    let end = offset
        .checked_add(size)
        .ok_or(ExceptionalHalt::ReturnDataOutOfBounds)?;
    if end > U256::from(state.return_data.len()) {
        return Err(ExceptionalHalt::ReturnDataOutOfBounds.into());
    }
    let data = state.return_data.clone();
    copy_to_memory(state, &data, dest, offset, size)?;
    Ok(Control::Continue)
}

pub(super) fn extcodehash(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let address = Address::from_word(state.stack.pop()?);
    let hash = if host.state().is_empty(&address)? {
        H256::ZERO
    } else {
        host.state().get_code_hash(&address)?
    };
    state.stack.push(hash.to_word())?;
    Ok(Control::Continue)
}

pub(super) fn selfbalance(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let balance = host.state().get_balance(&state.address)?;
    state.stack.push(balance)?;
    Ok(Control::Continue)
}

#[cfg(test)]
mod tests {
    use super::tail;
    use crate::error::ExceptionalHalt;
    use crate::test_utils::{eval, eval_with_data, run_code, CALLER, CONTRACT};
    use cadenza_primitives::U256;

    #[test]
    fn test_tail_clamps() {
        let source = [1u8, 2, 3, 4];
        assert_eq!(tail(&source, U256::from(1), 2), &[2, 3]);
        assert_eq!(tail(&source, U256::from(3), 8), &[4]);
        assert!(tail(&source, U256::from(9), 8).is_empty());
        assert!(tail(&source, U256::MAX, 8).is_empty());
    }

    #[test]
    fn test_address_and_caller() {
        assert_eq!(eval(&[0x30]), CONTRACT.to_word());
        assert_eq!(eval(&[0x33]), CALLER.to_word());
    }

    #[test]
    fn test_calldataload_pads() {
        let data = [0xAAu8, 0xBB];
        // CALLDATALOAD(0)
        let got = eval_with_data(&[0x60, 0x00, 0x35], &data);
        let mut expected = [0u8; 32];
        expected[0] = 0xAA;
        expected[1] = 0xBB;
        assert_eq!(got, U256::from_big_endian(&expected));
        // CALLDATALOAD(1) shifts by one byte
        let got = eval_with_data(&[0x60, 0x01, 0x35], &data);
        assert_eq!(got, U256::from(0xBB) << 248);
        assert_eq!(eval_with_data(&[0x36], &data), U256::from(2));
    }

    #[test]
    fn test_codecopy_then_mload() {
        // CODECOPY(0, 0, 32); MLOAD(0) yields the first code bytes
        let code = [0x60, 0x20, 0x60, 0x00, 0x60, 0x00, 0x39, 0x60, 0x00, 0x51];
        let got = eval(&code);
        assert_eq!(got.byte(31), 0x60);
        assert_eq!(got.byte(30), 0x20);
    }

    #[test]
    fn test_returndatacopy_out_of_bounds() {
        // RETURNDATACOPY(0, 0, 1) with an empty buffer
        let result = run_code(&[0x60, 0x01, 0x60, 0x00, 0x60, 0x00, 0x3e]);
        assert_eq!(
            result.exception_kind(),
            Some(ExceptionalHalt::ReturnDataOutOfBounds)
        );
        assert_eq!(result.gas_left, 0);
        // zero-length copy at offset zero is fine
        let result = run_code(&[0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x3e]);
        assert!(result.is_success());
    }

    #[test]
    fn test_extcodehash_missing_account() {
        // EXTCODEHASH(0xdead)
        assert_eq!(eval(&[0x61, 0xde, 0xad, 0x3f]), U256::zero());
    }
}
