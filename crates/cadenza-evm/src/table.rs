//! Opcode dispatch table

use crate::dynamic;
use crate::error::EvmResult;
use crate::gas;
use crate::hardfork::Ruleset;
use crate::host::Host;
use crate::instructions;
use crate::interpreter::{Control, RunState};
use crate::opcode::Opcode;
use std::fmt;

/// Opcode logic; runs after all gas for the step has been charged
pub type Handler = fn(&mut RunState<'_>, &mut dyn Host) -> EvmResult<Control>;

/// Dynamic gas function; may warm addresses or slots but never changes state
pub type DynamicGas = fn(&mut RunState<'_>, &mut dyn Host) -> EvmResult<u64>;

/// One populated dispatch slot
#[derive(Clone, Copy)]
pub struct OpInfo {
    /// Decoded opcode
    pub opcode: Opcode,
    /// Static gas under the table's rules
    pub static_gas: u64,
    /// Extra gas that depends on operands or access state
    pub dynamic: Option<DynamicGas>,
    /// Opcode logic
    pub handler: Handler,
}

impl fmt::Debug for OpInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpInfo")
            .field("opcode", &self.opcode)
            .field("static_gas", &self.static_gas)
            .field("dynamic", &self.dynamic.is_some())
            .finish()
    }
}

/// Fixed 256-entry table indexed by opcode byte.
///
/// Unassigned bytes and opcodes not active under the rules are empty slots,
/// so decoding an unknown opcode is a table miss.
pub struct JumpTable {
    entries: [Option<OpInfo>; 256],
}

impl JumpTable {
    /// Build the table for `rules`
    pub fn new(rules: &Ruleset) -> Self {
        let mut entries = [None; 256];
        for byte in 0..=255u8 {
            let Some(opcode) = Opcode::from_byte(byte) else {
                continue;
            };
            if !is_enabled(opcode, rules) {
                continue;
            }
            entries[byte as usize] = Some(OpInfo {
                opcode,
                static_gas: gas::static_gas(opcode, rules),
                dynamic: dynamic::for_opcode(opcode),
                handler: instructions::handler(opcode),
            });
        }
        Self { entries }
    }

    /// Slot for `byte`
    #[inline]
    pub fn get(&self, byte: u8) -> Option<&OpInfo> {
        self.entries[byte as usize].as_ref()
    }

    /// Number of active opcodes
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether no opcode is active
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for JumpTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JumpTable")
            .field("active", &self.len())
            .finish()
    }
}

/// Whether `opcode` exists under `rules`
pub fn is_enabled(opcode: Opcode, rules: &Ruleset) -> bool {
    match opcode {
        Opcode::CHAINID => rules.is_activated(1344),
        Opcode::SELFBALANCE => rules.is_activated(1884),
        Opcode::BASEFEE => rules.is_activated(3198),
        Opcode::PUSH0 => rules.is_activated(3855),
        Opcode::TLOAD | Opcode::TSTORE => rules.is_activated(1153),
        Opcode::MCOPY => rules.is_activated(5656),
        Opcode::BLOBHASH => rules.is_activated(4844),
        Opcode::BLOBBASEFEE => rules.is_activated(7516),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardfork::Hardfork;

    #[test]
    fn test_cancun_table() {
        let table = JumpTable::new(&Ruleset::new(Hardfork::Cancun));
        assert_eq!(table.len(), 149);
        assert_eq!(table.get(0x01).map(|i| i.opcode), Some(Opcode::ADD));
        assert_eq!(table.get(0x01).map(|i| i.static_gas), Some(3));
        assert!(table.get(0x0C).is_none());
        assert!(table.get(0x55).and_then(|i| i.dynamic).is_some());
        assert!(table.get(0x01).and_then(|i| i.dynamic).is_none());
    }

    #[test]
    fn test_older_forks_miss_new_opcodes() {
        let table = JumpTable::new(&Ruleset::new(Hardfork::Istanbul));
        assert!(table.get(Opcode::PUSH0.byte()).is_none());
        assert!(table.get(Opcode::BASEFEE.byte()).is_none());
        assert!(table.get(Opcode::TSTORE.byte()).is_none());
        assert!(table.get(Opcode::CHAINID.byte()).is_some());
        assert_eq!(table.len(), 149 - 7);

        let shanghai = JumpTable::new(&Ruleset::new(Hardfork::Shanghai));
        assert!(shanghai.get(Opcode::PUSH0.byte()).is_some());
        assert!(shanghai.get(Opcode::MCOPY.byte()).is_none());
    }

    #[test]
    fn test_extra_eip_enables_opcode() {
        let rules = Ruleset::with_extra_eips(Hardfork::Shanghai, &[5656]);
        let table = JumpTable::new(&rules);
        assert!(table.get(Opcode::MCOPY.byte()).is_some());
    }
}
