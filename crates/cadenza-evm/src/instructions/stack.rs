//! POP, PUSH, DUP and SWAP

use crate::error::EvmResult;
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use cadenza_primitives::U256;

pub(super) fn pop(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.pop()?;
    Ok(Control::Continue)
}

pub(super) fn push0(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::zero())?;
    Ok(Control::Continue)
}

/// PUSH1-PUSH32. Immediates running past the end of the code read as zero.
pub(super) fn push(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let size = state.opcode.push_size();
    let start = (state.pc + 1).min(state.code.len());
    let end = (start + size).min(state.code.len());

    let mut word = [0u8; 32];
    let available = &state.code[start..end];
    word[32 - size..32 - size + available.len()].copy_from_slice(available);
    state.stack.push(U256::from_big_endian(&word))?;

    state.pc += size;
    Ok(Control::Continue)
}

pub(super) fn dup(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.dup(state.opcode.dup_depth())?;
    Ok(Control::Continue)
}

pub(super) fn swap(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.swap(state.opcode.swap_depth())?;
    Ok(Control::Continue)
}

#[cfg(test)]
mod tests {
    use crate::error::ExceptionalHalt;
    use crate::test_utils::{eval, run_code, GAS_LIMIT};
    use cadenza_primitives::U256;

    #[test]
    fn test_push_sizes() {
        assert_eq!(eval(&[0x61, 0x12, 0x34]), U256::from(0x1234));
        let mut code = vec![0x7f];
        code.extend((1..=32u8).collect::<Vec<_>>());
        let got = eval(&code);
        assert_eq!(got.byte(31), 1);
        assert_eq!(got.byte(0), 32);
    }

    #[test]
    fn test_truncated_push_pads_low_bytes() {
        // PUSH2 0xAB at the end of the code reads as 0xAB00
        let result = run_code(&[0x61, 0xab]);
        assert!(result.is_success());
        assert_eq!(result.gas_used, 3);
    }

    #[test]
    fn test_push0() {
        let result = run_code(&[0x5f]);
        assert_eq!(result.gas_used, 2);
        assert_eq!(eval(&[0x60, 0x07, 0x5f, 0x01]), U256::from(7));
    }

    #[test]
    fn test_dup_and_swap() {
        // PUSH1 1, PUSH1 2, DUP2 -> top is 1
        assert_eq!(eval(&[0x60, 0x01, 0x60, 0x02, 0x81]), U256::one());
        // PUSH1 1, PUSH1 2, SWAP1 -> top is 1
        assert_eq!(eval(&[0x60, 0x01, 0x60, 0x02, 0x90]), U256::one());
    }

    #[test]
    fn test_underflow_consumes_all_gas() {
        let result = run_code(&[0x60, 0x01, 0x82]);
        assert_eq!(result.exception_kind(), Some(ExceptionalHalt::StackUnderflow));
        assert_eq!(result.gas_left, 0);
        assert_eq!(result.gas_used, GAS_LIMIT);
    }

    #[test]
    fn test_overflow_at_1025() {
        // 1025 x PUSH0
        let code = vec![0x5f; 1025];
        let result = run_code(&code);
        assert_eq!(result.exception_kind(), Some(ExceptionalHalt::StackOverflow));
    }
}
