//! Precompiled contracts reached through the call protocol

use bytes::Bytes;
use cadenza_evm::{Environment, Evm, EvmConfig, ExceptionalHalt, Hardfork, Message, PrecompileError, Precompiles, Ruleset};
use cadenza_primitives::{Address, U256};
use cadenza_state::MemoryState;

const CALLER: Address = Address::from_low_byte(0xCA);
const CONTRACT: Address = Address::from_low_byte(0xC0);

fn call_precompile(config: EvmConfig, index: u8, input: &[u8], gas: u64) -> cadenza_evm::ExecResult {
    let mut evm = Evm::new(MemoryState::new(), Environment::default(), config);
    let message = Message::call(
        CALLER,
        Address::from_low_byte(index),
        U256::zero(),
        gas,
        Bytes::copy_from_slice(input),
    );
    evm.run_call(&message).unwrap()
}

#[test]
fn sha256_of_abc() {
    let result = call_precompile(EvmConfig::default(), 0x02, b"abc", 1_000);
    assert!(result.is_success());
    assert_eq!(
        hex::encode(&result.output),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(result.gas_used, 60 + 12);
}

#[test]
fn ecrecover_on_garbage_returns_nothing() {
    let result = call_precompile(EvmConfig::default(), 0x01, &[0xff; 128], 10_000);
    assert!(result.is_success());
    assert!(result.output.is_empty());
    assert_eq!(result.gas_used, 3_000);
}

#[test]
fn bn128_add_rejects_point_off_curve() {
    // (1, 3) is not on y^2 = x^3 + 3
    let mut input = [0u8; 128];
    input[31] = 1;
    input[63] = 3;
    let result = call_precompile(EvmConfig::default(), 0x06, &input, 10_000);
    assert_eq!(
        result.exception_kind(),
        Some(ExceptionalHalt::PrecompileFailure("point not on curve"))
    );
    assert_eq!(result.gas_used, 10_000);
}

#[test]
fn bls_addresses_follow_activation() {
    let input = [0u8; 256];

    // plain Cancun: 0x0b is an ordinary empty account
    let result = call_precompile(EvmConfig::for_hardfork(Hardfork::Cancun), 0x0b, &input, 10_000);
    assert!(result.is_success());
    assert!(result.output.is_empty());
    assert_eq!(result.gas_used, 0);

    let mut config = EvmConfig::for_hardfork(Hardfork::Cancun);
    config.extra_eips = vec![2537];
    let result = call_precompile(config, 0x0b, &input, 10_000);
    assert!(result.is_success());
    assert_eq!(result.output.as_ref(), &[0u8; 128][..]);
    assert_eq!(result.gas_used, 375);
}

#[test]
fn precompile_table_per_hardfork() {
    let berlin = Precompiles::new(&Ruleset::new(Hardfork::Berlin));
    assert_eq!(berlin.len(), 9);
    assert!(!berlin.contains(&Address::from_low_byte(0x0a)));

    let cancun = Precompiles::new(&Ruleset::new(Hardfork::Cancun));
    assert_eq!(cancun.len(), 10);
    assert_eq!(
        cancun.addresses().last(),
        Some(Address::from_low_byte(0x0a))
    );

    let with_bls = Precompiles::new(&Ruleset::with_extra_eips(Hardfork::Cancun, &[2537]));
    assert_eq!(with_bls.len(), 17);
    assert!(with_bls.run(&Address::from_low_byte(0x12), &[], 100).is_none());
    assert_eq!(
        with_bls
            .run(&Address::from_low_byte(0x0b), &[0u8; 255], 1_000)
            .map(|r| r.map(|_| ())),
        Some(Err(PrecompileError::InvalidInputLength))
    );
}

#[test]
fn failing_precompile_pushes_zero_to_caller() {
    // CALL(gas, precompile, 0, 0, 0, 0, 0); MSTORE(0, flag); RETURN(0, 32)
    fn flag(index: u8, gas: u8) -> U256 {
        let code = [
            0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, index, 0x60, gas,
            0xf1, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
        ];
        let mut evm = Evm::new(MemoryState::new(), Environment::default(), EvmConfig::default());
        let message = Message::call(CALLER, CONTRACT, U256::zero(), 100_000, Bytes::new())
            .with_code(Bytes::copy_from_slice(&code));
        let result = evm.run_call(&message).unwrap();
        assert!(result.is_success());
        U256::from_big_endian(&result.output)
    }

    // ecrecover needs 3000
    assert_eq!(flag(0x01, 100), U256::zero());
    // identity on empty input needs 15
    assert_eq!(flag(0x04, 100), U256::one());
}
