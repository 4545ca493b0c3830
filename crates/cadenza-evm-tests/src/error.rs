//! Error types for fixture runs

use thiserror::Error;

/// Fixture error type
#[derive(Error, Debug)]
pub enum TestError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Fixture describes something the engine cannot be set up with
    #[error("Setup error: {0}")]
    Setup(String),

    /// The engine returned a hard error instead of a frame result
    #[error("Execution error: {0}")]
    Execution(#[from] cadenza_evm::EvmError),

    /// Outcome differs from the expectation
    #[error("Assertion failed: {0}")]
    Assertion(String),
}

impl From<cadenza_state::StateError> for TestError {
    fn from(e: cadenza_state::StateError) -> Self {
        TestError::Setup(e.to_string())
    }
}

/// Fixture result type
pub type TestResult<T> = Result<T, TestError>;
