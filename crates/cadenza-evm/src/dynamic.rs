//! Dynamic gas functions.
//!
//! Each function peeks at the operands without popping them and returns the
//! extra gas of the step. Access-list warming happens here, before the
//! opcode runs, so a step that cannot pay never reaches its handler.

use crate::error::{EvmResult, ExceptionalHalt};
use crate::gas::{self, cost};
use crate::host::Host;
use crate::interpreter::RunState;
use crate::opcode::Opcode;
use crate::table::DynamicGas;
use cadenza_primitives::{Address, H256, U256};

/// Dynamic gas function for `opcode`, if it has one
pub fn for_opcode(opcode: Opcode) -> Option<DynamicGas> {
    let f: DynamicGas = match opcode {
        Opcode::EXP => exp,
        Opcode::KECCAK256 => keccak256,
        Opcode::BALANCE | Opcode::EXTCODESIZE | Opcode::EXTCODEHASH => account_access,
        Opcode::EXTCODECOPY => extcodecopy,
        Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => data_copy,
        Opcode::MCOPY => mcopy,
        Opcode::MLOAD | Opcode::MSTORE => word_access,
        Opcode::MSTORE8 => byte_access,
        Opcode::SLOAD => sload,
        Opcode::SSTORE => sstore,
        Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => log,
        Opcode::CREATE | Opcode::CREATE2 => create,
        Opcode::CALL | Opcode::CALLCODE => call_with_value,
        Opcode::DELEGATECALL | Opcode::STATICCALL => call_without_value,
        Opcode::RETURN | Opcode::REVERT => return_data,
        Opcode::SELFDESTRUCT => selfdestruct,
        _ => return None,
    };
    Some(f)
}

/// Operand at `depth` below the top
fn operand(state: &RunState<'_>, depth: usize) -> Result<U256, ExceptionalHalt> {
    state.stack.peek(depth).copied()
}

/// Expansion cost for the largest of several `(offset, size)` operand pairs
fn expansion(state: &RunState<'_>, pairs: &[(usize, usize)]) -> Result<u64, ExceptionalHalt> {
    let mut widest: Option<(usize, usize)> = None;
    for &(offset_at, size_at) in pairs {
        let range = gas::memory_range(operand(state, offset_at)?, operand(state, size_at)?)?;
        if let Some((offset, size)) = range {
            let end = offset + size;
            if widest.map_or(true, |(o, s)| o + s < end) {
                widest = Some((offset, size));
            }
        }
    }
    Ok(gas::memory_expansion_cost(state.memory.len(), widest))
}

/// Copy length operand, already known to fit in memory
fn length(state: &RunState<'_>, depth: usize) -> Result<u64, ExceptionalHalt> {
    Ok(operand(state, depth)?.low_u64())
}

/// EIP-2929 surcharge for touching `address`; warms it
fn cold_account_surcharge(host: &mut dyn Host, address: Address) -> u64 {
    if !host.ruleset().is_activated(2929) {
        return 0;
    }
    if host.state().mark_warm_address(address) {
        cost::COLD_ACCOUNT_ACCESS - cost::WARM_STORAGE_READ
    } else {
        0
    }
}

fn exp(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<u64> {
    Ok(gas::exp_cost(operand(state, 1)?))
}

fn keccak256(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<u64> {
    let memory = expansion(state, &[(0, 1)])?;
    Ok(memory + gas::keccak256_cost(length(state, 1)?))
}

fn account_access(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<u64> {
    let address = Address::from_word(operand(state, 0)?);
    Ok(cold_account_surcharge(host, address))
}

fn extcodecopy(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<u64> {
    let memory = expansion(state, &[(1, 3)])?;
    let copy = gas::copy_cost(length(state, 3)?);
    let address = Address::from_word(operand(state, 0)?);
    Ok(memory + copy + cold_account_surcharge(host, address))
}

fn data_copy(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<u64> {
    let memory = expansion(state, &[(0, 2)])?;
    Ok(memory + gas::copy_cost(length(state, 2)?))
}

fn mcopy(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<u64> {
    // destination and source share the length operand
    let memory = expansion(state, &[(0, 2), (1, 2)])?;
    Ok(memory + gas::copy_cost(length(state, 2)?))
}

fn word_access(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<u64> {
    let range = gas::memory_range(operand(state, 0)?, U256::from(32))?;
    Ok(gas::memory_expansion_cost(state.memory.len(), range))
}

fn byte_access(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<u64> {
    let range = gas::memory_range(operand(state, 0)?, U256::one())?;
    Ok(gas::memory_expansion_cost(state.memory.len(), range))
}

fn sload(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<u64> {
    if !host.ruleset().is_activated(2929) {
        return Ok(0);
    }
    let key = H256::from_word(operand(state, 0)?);
    if host.state().mark_warm_slot(state.address, key) {
        Ok(cost::COLD_SLOAD - cost::WARM_STORAGE_READ)
    } else {
        Ok(0)
    }
}

fn sstore(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<u64> {
    if state.gas.left() <= cost::SSTORE_SENTRY {
        return Err(ExceptionalHalt::OutOfGas.into());
    }
    let key = H256::from_word(operand(state, 0)?);
    let new = H256::from_word(operand(state, 1)?);
    let address = state.address;

    let mut total = 0;
    if host.ruleset().is_activated(2929) && host.state().mark_warm_slot(address, key) {
        total += cost::COLD_SLOAD;
    }
    let current = host.state().get_storage(&address, &key)?;
    let original = host.state().get_original_storage(&address, &key)?;
    total += gas::sstore_charge(host.ruleset(), &original, &current, &new).gas;
    Ok(total)
}

fn log(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<u64> {
    let memory = expansion(state, &[(0, 1)])?;
    Ok(memory + gas::log_data_cost(length(state, 1)?))
}

fn create(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<u64> {
    let memory = expansion(state, &[(1, 2)])?;
    let init_len = length(state, 2)?;
    let limit_initcode =
        host.ruleset().is_activated(3860) && !host.config().allow_unlimited_initcode_size;
    if limit_initcode && init_len > cost::MAX_INIT_CODE_SIZE as u64 {
        return Err(ExceptionalHalt::InitcodeSizeViolation.into());
    }
    let create2 = state.opcode == Opcode::CREATE2;
    Ok(memory + gas::create_cost(init_len, create2, host.ruleset()))
}

fn call_with_value(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<u64> {
    let memory = expansion(state, &[(3, 4), (5, 6)])?;
    let target = Address::from_word(operand(state, 1)?);
    let value = operand(state, 2)?;

    let mut total = memory + cold_account_surcharge(host, target);
    if !value.is_zero() {
        total += cost::CALL_VALUE;
        if state.opcode == Opcode::CALL && host.state().is_empty(&target)? {
            total += cost::CALL_NEW_ACCOUNT;
        }
    }
    Ok(total)
}

fn call_without_value(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<u64> {
    let memory = expansion(state, &[(2, 3), (4, 5)])?;
    let target = Address::from_word(operand(state, 1)?);
    Ok(memory + cold_account_surcharge(host, target))
}

fn return_data(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<u64> {
    expansion(state, &[(0, 1)]).map_err(Into::into)
}

fn selfdestruct(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<u64> {
    let beneficiary = Address::from_word(operand(state, 0)?);
    let mut total = 0;
    if host.ruleset().is_activated(2929) && host.state().mark_warm_address(beneficiary) {
        total += cost::COLD_ACCOUNT_ACCESS;
    }
    let balance = host.state().get_balance(&state.address)?;
    if !balance.is_zero() && host.state().is_empty(&beneficiary)? {
        total += cost::SELFDESTRUCT_NEW_ACCOUNT;
    }
    Ok(total)
}
