//! Parsing errors for fixed-size byte types

use thiserror::Error;

/// Error produced when building an [`Address`](crate::Address) or
/// [`H256`](crate::H256) from untrusted input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// Input was not valid hex
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Input had the wrong number of bytes
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required byte length
        expected: usize,
        /// Byte length of the input
        got: usize,
    },
}

/// Decode a hex string with an optional `0x` prefix
pub(crate) fn decode_hex(s: &str) -> Result<Vec<u8>, PrimitiveError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| PrimitiveError::InvalidHex(e.to_string()))
}
