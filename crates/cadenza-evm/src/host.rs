//! Capabilities the interpreter needs from its owner

use crate::config::EvmConfig;
use crate::context::Environment;
use crate::error::EvmResult;
use crate::hardfork::Ruleset;
use crate::message::Message;
use crate::result::ExecResult;
use crate::tracer::StepEvent;
use cadenza_primitives::Address;
use cadenza_state::StateAccess;

/// Everything an opcode may reach outside its own frame.
///
/// The interpreter only sees this trait, never the orchestrator type, so a
/// CALL or CREATE opcode re-enters the call protocol through [`Host::call`].
pub trait Host {
    /// Block and transaction context
    fn env(&self) -> &Environment;

    /// Active rules
    fn ruleset(&self) -> &Ruleset;

    /// Engine configuration
    fn config(&self) -> &EvmConfig;

    /// World state
    fn state(&mut self) -> &mut dyn StateAccess;

    /// Whether `address` is an active precompile
    fn is_precompile(&self, address: &Address) -> bool;

    /// Run a nested call or creation
    fn call(&mut self, message: &Message) -> EvmResult<ExecResult>;

    /// Forward a step to the attached tracer
    fn step(&mut self, event: &StepEvent);

    /// Whether a tracer is attached; step events are only built when it is
    fn tracing(&self) -> bool;

    /// Whether execution must stop now
    fn interrupted(&self) -> bool;
}
