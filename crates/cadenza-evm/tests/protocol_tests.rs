//! Call protocol properties
//!
//! Tests cover:
//! - Checkpoint balance across nested, failing and reverting frames
//! - Cancellation from another thread and by timeout
//! - The 63/64 sub-call rule over random gas amounts
//! - Tracing leaves gas and results untouched
//! - Every top-level call starts a fresh transaction
//! - Gas left never grows within a frame

use bytes::Bytes;
use cadenza_evm::gas::all_but_one_64th;
use cadenza_evm::{
    CollectingTracer, Environment, Evm, EvmConfig, EvmError, ExecResult, Hardfork, JsonTracer,
    Message, StepEvent, Tracer,
};
use cadenza_primitives::{Address, H256, U256};
use cadenza_state::{MemoryState, StateAccess, StateError};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const CALLER: Address = Address::from_low_byte(0xCA);
const CONTRACT: Address = Address::from_low_byte(0xC0);

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn evm(state: MemoryState) -> Evm<MemoryState> {
    Evm::new(state, Environment::default(), EvmConfig::default())
}

fn message(code: Vec<u8>, gas: u64) -> Message {
    Message::call(CALLER, CONTRACT, U256::zero(), gas, Bytes::new()).with_code(Bytes::from(code))
}

/// CALL(requested, target, 0, 0, 0, 0, 0), result flag left on the stack
fn call(target: u8, requested: u32) -> Vec<u8> {
    let mut code = vec![0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, target, 0x63];
    code.extend_from_slice(&requested.to_be_bytes());
    code.push(0xf1);
    code
}

/// CALL(requested, target, value, 0, 0, 0, 0), result flag left on the stack
fn call_value(target: u8, value: u8, requested: u16) -> Vec<u8> {
    let mut code = vec![0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, value, 0x60, target, 0x61];
    code.extend_from_slice(&requested.to_be_bytes());
    code.push(0xf1);
    code
}

#[derive(Clone, Default)]
struct FrameGas(Arc<Mutex<Vec<u64>>>);

impl Tracer for FrameGas {
    fn on_enter(&mut self, message: &Message) {
        self.0.lock().push(message.gas_limit);
    }

    fn on_step(&mut self, _event: &StepEvent) {}
}

// ============================================================================
// Checkpoint balance
// ============================================================================

#[test]
fn checkpoints_balance_across_mixed_outcomes() {
    let state = MemoryState::new()
        // succeeds after a write
        .with_account(Address::from_low_byte(0xA1), U256::zero(), vec![0x60, 0x01, 0x60, 0x00, 0x55])
        // reverts
        .with_account(Address::from_low_byte(0xA2), U256::zero(), vec![0x60, 0x00, 0x60, 0x00, 0xfd])
        // invalid opcode
        .with_account(Address::from_low_byte(0xA3), U256::zero(), vec![0xfe])
        // calls 0xA1 and then reverts
        .with_account(Address::from_low_byte(0xA4), U256::zero(), {
            let mut code = call(0xA1, 100_000);
            code.extend_from_slice(&[0x60, 0x00, 0x60, 0x00, 0xfd]);
            code
        });

    let mut code = Vec::new();
    for target in [0xA1, 0xA2, 0xA3, 0xA4] {
        code.extend(call(target, 200_000));
        code.push(0x50);
    }
    let mut evm = evm(state);
    let result = evm.run_call(&message(code, 1_000_000)).unwrap();
    assert!(result.is_success());

    let state = evm.state();
    let stats = state.checkpoint_stats();
    // top frame, four children and one grandchild
    assert_eq!(stats.opened, 6);
    assert_eq!(stats.committed, 3);
    assert_eq!(stats.reverted, 3);
    assert!(stats.is_balanced());
    assert_eq!(state.open_checkpoints(), 0);

    // only the direct write by 0xA1 survives
    assert_eq!(state.storage_of(&Address::from_low_byte(0xA1)).len(), 1);
}

#[test]
fn exceptional_halt_discards_nested_writes() {
    // child writes, parent then hits INVALID
    let state = MemoryState::new().with_account(
        Address::from_low_byte(0xA1),
        U256::zero(),
        vec![0x60, 0x01, 0x60, 0x00, 0x55],
    );
    let mut code = vec![0x60, 0x05, 0x60, 0x09, 0x55];
    code.extend(call(0xA1, 100_000));
    code.push(0xfe);

    let mut evm = evm(state);
    let result = evm.run_call(&message(code, 1_000_000)).unwrap();
    assert!(result.exception_kind().is_some());
    assert_eq!(result.gas_used, 1_000_000);
    assert!(evm.state().storage_of(&CONTRACT).is_empty());
    assert!(evm.state().storage_of(&Address::from_low_byte(0xA1)).is_empty());
    assert!(evm.state().checkpoint_stats().is_balanced());
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn interrupt_from_other_thread_unwinds_nested_frames() {
    init_tracing();
    // callee loops forever
    let state = MemoryState::new()
        .with_account(CALLER, U256::from(1_000), Vec::new())
        .with_account(Address::from_low_byte(0xA1), U256::zero(), vec![0x5b, 0x60, 0x00, 0x56]);
    // SSTORE(0, 1) then call the looping account
    let mut code = vec![0x60, 0x01, 0x60, 0x00, 0x55];
    code.extend(call(0xA1, u32::MAX));

    let mut evm = evm(state);
    let handle = evm.interrupt_handle();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        handle.interrupt();
    });

    let message = Message::call(CALLER, CONTRACT, U256::from(10), u64::MAX / 2, Bytes::new())
        .with_code(Bytes::from(code));
    assert_eq!(evm.run_call(&message), Err(EvmError::Cancelled));
    canceller.join().unwrap();

    let state = evm.state();
    assert_eq!(state.open_checkpoints(), 0);
    let stats = state.checkpoint_stats();
    assert_eq!(stats.opened, 2);
    assert_eq!(stats.reverted, 2);
    assert!(state.storage_of(&CONTRACT).is_empty());
    assert_eq!(state.get_balance(&CALLER).unwrap(), U256::from(1_000));
}

#[test]
fn reset_handle_allows_next_run() {
    let mut evm = evm(MemoryState::new());
    let handle = evm.interrupt_handle();
    handle.interrupt();
    assert_eq!(
        evm.run_call(&message(vec![0x00], 100)),
        Err(EvmError::Cancelled)
    );
    handle.reset();
    assert!(evm.run_call(&message(vec![0x00], 100)).unwrap().is_success());
}

#[test]
fn timeout_from_config() {
    init_tracing();
    let config = EvmConfig::from_json_str(r#"{"timeout_ms": 10}"#).unwrap();
    let mut evm = Evm::new(MemoryState::new(), Environment::default(), config);
    let result = evm.run_call(&message(vec![0x5b, 0x60, 0x00, 0x56], u64::MAX / 2));
    assert_eq!(result, Err(EvmError::Cancelled));
    assert!(evm.state().checkpoint_stats().is_balanced());
}

// ============================================================================
// Tracing
// ============================================================================

#[test]
fn tracing_does_not_change_results() {
    let code = {
        let mut code = vec![0x60, 0x01, 0x60, 0x00, 0x55];
        code.extend(call(0x04, 1_000));
        code.push(0x00);
        code
    };
    let plain = evm(MemoryState::new())
        .run_call(&message(code.clone(), 100_000))
        .unwrap();

    let tracer = CollectingTracer::new();
    let traced = evm(MemoryState::new())
        .with_tracer(Box::new(tracer.clone()))
        .run_call(&message(code, 100_000))
        .unwrap();

    assert_eq!(plain, traced);
    assert_eq!(tracer.frames().len(), 4);
    assert!(tracer.op_names().contains(&"SSTORE"));
}

#[test]
fn json_tracer_emits_one_line_per_step() {
    let shared = Arc::new(Mutex::new(Vec::new()));

    struct SharedWriter(Arc<Mutex<Vec<u8>>>);
    impl std::io::Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let tracer = JsonTracer::new(SharedWriter(shared.clone()));
    let config = EvmConfig::for_hardfork(Hardfork::Shanghai);
    let mut evm = Evm::new(MemoryState::new(), Environment::default(), config)
        .with_tracer(Box::new(tracer));
    evm.run_call(&message(vec![0x5f, 0x60, 0x02, 0x01, 0x00], 100))
        .unwrap();

    let out = String::from_utf8(shared.lock().clone()).unwrap();
    let names: Vec<String> = out
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["op_name"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(names, vec!["PUSH0", "PUSH1", "ADD", "STOP"]);
}

// ============================================================================
// 63/64 rule
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn granted_gas_is_capped(parent_gas in 10_000u64..5_000_000, requested in any::<u32>()) {
        let frames = FrameGas::default();
        let mut evm = evm(MemoryState::new()).with_tracer(Box::new(frames.clone()));
        evm.run_call(&message(call(0xEE, requested), parent_gas)).unwrap();

        // six PUSH1, one PUSH4, cold CALL
        let available = parent_gas - 7 * 3 - 2600;
        let expected = (requested as u64).min(all_but_one_64th(available));
        let entered = frames.0.lock().clone();
        prop_assert_eq!(entered, vec![parent_gas, expected]);
    }
}

// ============================================================================
// Transaction scope
// ============================================================================

#[test]
fn consecutive_calls_start_fresh_transactions() {
    let mut state = MemoryState::new();
    state.insert_storage(CONTRACT, H256::ZERO, H256::from_word(U256::one()));
    let mut evm = evm(state);

    // SSTORE(0, 0) clears the seeded slot
    let cleared = evm
        .run_call(&message(vec![0x60, 0x00, 0x60, 0x00, 0x55], 100_000))
        .unwrap();
    assert!(cleared.is_success());
    assert_eq!(cleared.gas_refund, 4_800);

    // SSTORE(0, 1) is a fresh set of a cold slot whose original value is zero
    let set = evm
        .run_call(&message(vec![0x60, 0x01, 0x60, 0x00, 0x55], 100_000))
        .unwrap();
    assert!(set.is_success());
    assert_eq!(set.gas_used, 6 + 2_100 + 20_000);
    assert_eq!(set.gas_refund, 0);
    assert_eq!(
        evm.state().get_storage(&CONTRACT, &H256::ZERO).unwrap(),
        H256::from_word(U256::one())
    );

    // TSTORE(1, 9) in one transaction is gone in the next
    let stored = evm
        .run_call(&message(vec![0x60, 0x09, 0x60, 0x01, 0x5d, 0x00], 100_000))
        .unwrap();
    assert!(stored.is_success());
    let loaded = evm
        .run_call(&message(
            vec![0x60, 0x01, 0x5c, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3],
            100_000,
        ))
        .unwrap();
    assert_eq!(loaded.output.as_ref(), &[0u8; 32][..]);

    // a plain transfer elsewhere leaves the contract and its slot cold
    let other = Address::from_low_byte(0xA1);
    evm.run_call(&Message::call(CALLER, other, U256::zero(), 0, Bytes::new()))
        .unwrap();
    assert!(evm.state().is_warm_address(&other));
    assert!(!evm.state().is_warm_address(&CONTRACT));
    assert!(!evm.state().is_warm_slot(&CONTRACT, &H256::ZERO));
}

#[test]
fn top_level_call_with_open_checkpoint_is_rejected() {
    let mut evm = evm(MemoryState::new());
    let open = evm.state_mut().checkpoint();
    assert_eq!(
        evm.run_call(&message(vec![0x00], 100)),
        Err(EvmError::State(StateError::CheckpointsOpen(1)))
    );
    evm.state_mut().commit(open).unwrap();
    assert!(evm.run_call(&message(vec![0x00], 100)).unwrap().is_success());
}

// ============================================================================
// Gas monotonicity
// ============================================================================

#[derive(Default)]
struct Trail {
    /// Gas left at the last step of every open frame
    open: Vec<Option<u64>>,
    steps: usize,
    /// (depth, pc, before, after) for every increase
    increases: Vec<(usize, usize, u64, u64)>,
}

#[derive(Clone, Default)]
struct GasTrail(Arc<Mutex<Trail>>);

impl Tracer for GasTrail {
    fn on_enter(&mut self, _message: &Message) {
        self.0.lock().open.push(None);
    }

    fn on_step(&mut self, event: &StepEvent) {
        let mut trail = self.0.lock();
        let trail = &mut *trail;
        trail.steps += 1;
        if let Some(last) = trail.open.last_mut() {
            if let Some(previous) = *last {
                if event.gas_left > previous {
                    trail
                        .increases
                        .push((event.depth, event.pc, previous, event.gas_left));
                }
            }
            *last = Some(event.gas_left);
        }
    }

    fn on_exit(&mut self, _depth: usize, _result: &ExecResult) {
        self.0.lock().open.pop();
    }
}

/// Value call into a cheap callee, set then clear a slot, call a reverting
/// callee, touch memory far out
fn monotonic_program(value: u8, requested: u16) -> Vec<u8> {
    let mut code = call_value(0xA1, value, requested);
    code.push(0x50);
    code.extend_from_slice(&[0x60, 0x01, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0x55]);
    code.extend(call_value(0xA2, 0, requested));
    code.push(0x50);
    code.extend_from_slice(&[0x60, 0x00, 0x61, 0x04, 0x00, 0x52, 0x00]);
    code
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn gas_left_never_grows_within_a_frame(
        parent_gas in 2_000u64..200_000,
        value in 0u8..2,
        requested in any::<u16>(),
    ) {
        let state = MemoryState::new()
            .with_account(CONTRACT, U256::from(1_000), Vec::new())
            // 1 + 2, discarded
            .with_account(Address::from_low_byte(0xA1), U256::zero(), vec![0x60, 0x01, 0x60, 0x02, 0x01, 0x50, 0x00])
            // SSTORE(0, 7) then REVERT
            .with_account(
                Address::from_low_byte(0xA2),
                U256::zero(),
                vec![0x60, 0x07, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0xfd],
            );
        let trail = GasTrail::default();
        let mut evm = evm(state).with_tracer(Box::new(trail.clone()));
        evm.run_call(&message(monotonic_program(value, requested), parent_gas)).unwrap();

        let trail = trail.0.lock();
        prop_assert!(trail.steps > 0);
        prop_assert!(trail.open.is_empty());
        prop_assert!(trail.increases.is_empty(), "gas grew: {:?}", trail.increases);
    }
}
