//! Type definitions for the JSON fixture format

use cadenza_evm::EvmConfig;
use cadenza_primitives::{Address, H256, U256};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

fn strip_hex(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

/// Hex-encoded bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(strip_hex(&s))
            .map(HexBytes)
            .map_err(serde::de::Error::custom)
    }
}

/// Hex-encoded 256-bit word, leading zeros optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct HexWord(pub U256);

impl<'de> Deserialize<'de> for HexWord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let digits = strip_hex(&s);
        if digits.is_empty() {
            return Ok(HexWord(U256::zero()));
        }
        U256::from_str_radix(digits, 16)
            .map(HexWord)
            .map_err(serde::de::Error::custom)
    }
}

impl HexWord {
    /// The word as a storage key or value
    pub fn to_h256(self) -> H256 {
        H256::from_word(self.0)
    }
}

/// Hex-encoded u64
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexU64(pub u64);

impl<'de> Deserialize<'de> for HexU64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let digits = strip_hex(&s);
        if digits.is_empty() {
            return Ok(HexU64(0));
        }
        u64::from_str_radix(digits, 16)
            .map(HexU64)
            .map_err(serde::de::Error::custom)
    }
}

/// One fixture file: test name to test case
pub type FixtureFile = BTreeMap<String, Fixture>;

/// A single test case
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    /// Engine configuration
    #[serde(default)]
    pub config: EvmConfig,
    /// Block and transaction context
    #[serde(default)]
    pub env: FixtureEnv,
    /// Accounts present before execution
    #[serde(default)]
    pub pre: BTreeMap<Address, FixtureAccount>,
    /// Message to execute
    pub exec: FixtureExec,
    /// Expected outcome
    pub expect: FixtureExpect,
}

/// Block and transaction context
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureEnv {
    /// Block coinbase
    #[serde(default)]
    pub coinbase: Address,
    /// Block number
    #[serde(default)]
    pub number: HexU64,
    /// Block timestamp
    #[serde(default)]
    pub timestamp: HexU64,
    /// Block gas limit
    pub gas_limit: Option<HexU64>,
    /// Chain id
    pub chain_id: Option<HexU64>,
    /// Base fee
    #[serde(default)]
    pub base_fee: HexWord,
    /// PREVRANDAO value
    pub prevrandao: Option<H256>,
    /// Transaction origin; defaults to the caller
    pub origin: Option<Address>,
    /// Gas price
    #[serde(default)]
    pub gas_price: HexWord,
}

/// Account in the pre-state
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureAccount {
    /// Balance
    #[serde(default)]
    pub balance: HexWord,
    /// Nonce
    #[serde(default)]
    pub nonce: HexU64,
    /// Code
    #[serde(default)]
    pub code: HexBytes,
    /// Storage slots
    #[serde(default)]
    pub storage: BTreeMap<HexWord, HexWord>,
}

/// Message to execute
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureExec {
    /// Sender
    pub caller: Address,
    /// Recipient; absent for contract creation
    pub to: Option<Address>,
    /// Value transferred
    #[serde(default)]
    pub value: HexWord,
    /// Gas limit
    pub gas: HexU64,
    /// Call data, or init code for creation
    #[serde(default)]
    pub data: HexBytes,
    /// Code to run instead of the recipient's code
    pub code: Option<HexBytes>,
    /// CREATE2 salt
    pub salt: Option<H256>,
    /// Read-only context
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

/// Expected frame status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedStatus {
    /// Normal halt
    Success,
    /// REVERT
    Revert,
    /// Exceptional halt
    Exception,
}

/// Expected outcome
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureExpect {
    /// Frame status
    pub status: ExpectedStatus,
    /// Halt name when `status` is `exception`, e.g. `OutOfGas`
    pub exception: Option<String>,
    /// Gas used
    pub gas_used: Option<HexU64>,
    /// Returned bytes
    pub output: Option<HexBytes>,
    /// Address of the created contract
    pub created_address: Option<Address>,
    /// Number of logs
    pub logs: Option<usize>,
    /// Storage after execution; listed slots only, zero means unset
    #[serde(default)]
    pub storage: BTreeMap<Address, BTreeMap<HexWord, HexWord>>,
    /// Balances after execution
    #[serde(default)]
    pub balances: BTreeMap<Address, HexWord>,
    /// Nonces after execution
    #[serde(default)]
    pub nonces: BTreeMap<Address, HexU64>,
}
