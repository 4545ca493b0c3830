//! Hardfork rules and activated EIP sets

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Supported hardforks, oldest first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hardfork {
    /// Istanbul (EIP-2200 net metering, CHAINID, SELFBALANCE)
    Istanbul,
    /// Berlin (EIP-2929 access lists)
    Berlin,
    /// London (BASEFEE, reduced refunds)
    London,
    /// Shanghai (PUSH0, initcode limit)
    Shanghai,
    /// Cancun (transient storage, MCOPY, blobs)
    Cancun,
    /// Prague (BLS12-381 precompiles)
    Prague,
}

impl Hardfork {
    /// Every fork in activation order
    pub const ALL: [Hardfork; 6] = [
        Hardfork::Istanbul,
        Hardfork::Berlin,
        Hardfork::London,
        Hardfork::Shanghai,
        Hardfork::Cancun,
        Hardfork::Prague,
    ];

    /// EIPs introduced by this fork alone
    pub fn introduced_eips(self) -> &'static [u32] {
        match self {
            Hardfork::Istanbul => &[152, 1108, 1344, 1884, 2200],
            Hardfork::Berlin => &[2565, 2929, 2930],
            Hardfork::London => &[1559, 3198, 3529, 3541],
            Hardfork::Shanghai => &[3651, 3855, 3860],
            Hardfork::Cancun => &[1153, 4844, 5656, 6780, 7516],
            Hardfork::Prague => &[2537],
        }
    }
}

impl Default for Hardfork {
    fn default() -> Self {
        Hardfork::Cancun
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Active hardfork plus the resolved set of EIPs in force
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ruleset {
    hardfork: Hardfork,
    eips: BTreeSet<u32>,
}

impl Ruleset {
    /// Rules of `hardfork` with no extra EIPs
    pub fn new(hardfork: Hardfork) -> Self {
        Self::with_extra_eips(hardfork, &[])
    }

    /// Rules of `hardfork`, plus opt-in EIPs
    pub fn with_extra_eips(hardfork: Hardfork, extra: &[u32]) -> Self {
        let mut eips: BTreeSet<u32> = Hardfork::ALL
            .iter()
            .filter(|fork| **fork <= hardfork)
            .flat_map(|fork| fork.introduced_eips().iter().copied())
            .collect();
        eips.extend(extra.iter().copied());
        Self { hardfork, eips }
    }

    /// The base hardfork
    pub fn hardfork(&self) -> Hardfork {
        self.hardfork
    }

    /// Whether `eip` is in force
    #[inline]
    pub fn is_activated(&self, eip: u32) -> bool {
        self.eips.contains(&eip)
    }

    /// All EIPs in force, ascending
    pub fn eips(&self) -> impl Iterator<Item = u32> + '_ {
        self.eips.iter().copied()
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Ruleset::new(Hardfork::default())
    }
}
