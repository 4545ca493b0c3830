//! Engine configuration

use crate::hardfork::{Hardfork, Ruleset};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmConfig {
    /// Active hardfork
    #[serde(default)]
    pub hardfork: Hardfork,
    /// EIPs enabled on top of the hardfork
    #[serde(default)]
    pub extra_eips: Vec<u32>,
    /// Lift the deployed code size limit (EIP-170)
    #[serde(default)]
    pub allow_unlimited_contract_size: bool,
    /// Lift the init code size limit (EIP-3860)
    #[serde(default)]
    pub allow_unlimited_initcode_size: bool,
    /// Wall-clock budget for one top-level call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Option<u64>,
}

fn default_timeout_ms() -> Option<u64> {
    None
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            hardfork: Hardfork::default(),
            extra_eips: Vec::new(),
            allow_unlimited_contract_size: false,
            allow_unlimited_initcode_size: false,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl EvmConfig {
    /// Default configuration for `hardfork`
    pub fn for_hardfork(hardfork: Hardfork) -> Self {
        Self {
            hardfork,
            ..Default::default()
        }
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Resolved rule set
    pub fn ruleset(&self) -> Ruleset {
        Ruleset::with_extra_eips(self.hardfork, &self.extra_eips)
    }

    /// Timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
