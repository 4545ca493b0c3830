//! Block information opcodes

use crate::error::EvmResult;
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use cadenza_primitives::{word_to_usize, H256, U256};

pub(super) fn blockhash(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let number = state.stack.pop()?;
    let hash = host.env().block.block_hash(number);
    state.stack.push(hash.to_word())?;
    Ok(Control::Continue)
}

pub(super) fn coinbase(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(host.env().block.coinbase.to_word())?;
    Ok(Control::Continue)
}

pub(super) fn timestamp(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(host.env().block.timestamp))?;
    Ok(Control::Continue)
}

pub(super) fn number(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(host.env().block.number))?;
    Ok(Control::Continue)
}

pub(super) fn prevrandao(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(host.env().block.prevrandao.to_word())?;
    Ok(Control::Continue)
}

pub(super) fn gaslimit(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(host.env().block.gas_limit))?;
    Ok(Control::Continue)
}

pub(super) fn chainid(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(U256::from(host.env().block.chain_id))?;
    Ok(Control::Continue)
}

pub(super) fn basefee(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(host.env().block.base_fee)?;
    Ok(Control::Continue)
}

pub(super) fn blobhash(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    let index = state.stack.pop()?;
    let hash = word_to_usize(&index)
        .and_then(|i| host.env().tx.blob_hashes.get(i).copied())
        .unwrap_or(H256::ZERO);
    state.stack.push(hash.to_word())?;
    Ok(Control::Continue)
}

pub(super) fn blobbasefee(state: &mut RunState<'_>, host: &mut dyn Host) -> EvmResult<Control> {
    state.stack.push(host.env().block.blob_base_fee)?;
    Ok(Control::Continue)
}

#[cfg(test)]
mod tests {
    use crate::context::{BlockContext, Environment, TxContext};
    use crate::test_utils::eval_in;
    use cadenza_primitives::{Address, H256, U256};
    use cadenza_state::MemoryState;

    fn env() -> Environment {
        let mut block = BlockContext {
            number: 300,
            timestamp: 1_700_000_000,
            coinbase: Address::from_low_byte(0xCB),
            chain_id: 5,
            base_fee: U256::from(7),
            ..Default::default()
        };
        block.block_hashes.insert(299, H256::from_word(U256::from(0x299)));
        block.block_hashes.insert(10, H256::from_word(U256::from(0x10)));
        let tx = TxContext {
            origin: Address::from_low_byte(0x0A),
            gas_price: U256::from(3),
            blob_hashes: vec![H256::from_word(U256::from(0xB1))],
        };
        Environment::new(block, tx)
    }

    fn eval_env(code: &[u8]) -> U256 {
        eval_in(env(), MemoryState::new(), code)
    }

    #[test]
    fn test_block_fields() {
        assert_eq!(eval_env(&[0x43]), U256::from(300));
        assert_eq!(eval_env(&[0x42]), U256::from(1_700_000_000u64));
        assert_eq!(eval_env(&[0x46]), U256::from(5));
        assert_eq!(eval_env(&[0x48]), U256::from(7));
        assert_eq!(eval_env(&[0x41]), Address::from_low_byte(0xCB).to_word());
        assert_eq!(eval_env(&[0x32]), Address::from_low_byte(0x0A).to_word());
        assert_eq!(eval_env(&[0x3a]), U256::from(3));
    }

    #[test]
    fn test_blockhash_window() {
        // BLOCKHASH(299) is visible, BLOCKHASH(10) is too old
        assert_eq!(eval_env(&[0x61, 0x01, 0x2b, 0x40]), U256::from(0x299));
        assert_eq!(eval_env(&[0x60, 0x0a, 0x40]), U256::zero());
        // the current block is never visible
        assert_eq!(eval_env(&[0x61, 0x01, 0x2c, 0x40]), U256::zero());
    }

    #[test]
    fn test_blobhash_index() {
        assert_eq!(eval_env(&[0x60, 0x00, 0x49]), U256::from(0xB1));
        assert_eq!(eval_env(&[0x60, 0x01, 0x49]), U256::zero());
    }
}
