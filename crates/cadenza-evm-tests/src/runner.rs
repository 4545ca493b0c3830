//! Fixture runner and statistics

use crate::error::{TestError, TestResult};
use crate::types::*;
use bytes::Bytes;
use cadenza_evm::{BlockContext, Environment, Evm, ExecResult, ExitStatus, Message, TxContext};
use cadenza_primitives::H256;
use cadenza_state::{MemoryState, StateAccess};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Results of one fixture file
#[derive(Debug)]
pub struct FixtureResults {
    /// File path
    pub file: String,
    /// Passed fixtures
    pub passed: Vec<String>,
    /// Failed fixtures (name, reason)
    pub failed: Vec<(String, String)>,
}

impl FixtureResults {
    /// Create empty results
    pub fn new(file: String) -> Self {
        Self {
            file,
            passed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Total number of fixtures
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }
}

/// Aggregated statistics over many files
#[derive(Debug, Default)]
pub struct FixtureStats {
    /// Fixtures executed
    pub total: usize,
    /// Fixtures passed
    pub passed: usize,
    /// Fixtures failed
    pub failed: usize,
    /// Files that could not be read or parsed
    pub broken_files: Vec<(String, String)>,
    /// Wall-clock time
    pub duration: Duration,
    /// Failed fixture names with reasons
    pub failures: Vec<(String, String)>,
}

impl FixtureStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the results of one file
    pub fn add_results(&mut self, results: &FixtureResults) {
        self.total += results.total();
        self.passed += results.passed.len();
        self.failed += results.failed.len();
        for (name, reason) in &results.failed {
            self.failures
                .push((format!("{}::{}", results.file, name), reason.clone()));
        }
    }

    /// Whether every fixture passed and every file parsed
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.broken_files.is_empty()
    }

    /// Pass rate as percentage
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.passed as f64 / self.total as f64) * 100.0
    }

    /// Print summary
    pub fn print_summary(&self) {
        println!("\n========================================");
        println!("Fixture Summary");
        println!("========================================");
        println!("Total:   {}", self.total);
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Pass Rate: {:.2}%", self.pass_rate());
        println!("Duration: {:.2}s", self.duration.as_secs_f64());

        if !self.broken_files.is_empty() {
            println!("\nUnreadable files:");
            for (file, reason) in &self.broken_files {
                println!("  - {}: {}", file, reason);
            }
        }
        if !self.failures.is_empty() {
            println!("\nFailed fixtures:");
            for (name, reason) in &self.failures {
                println!("  - {}: {}", name, reason);
            }
        }
    }
}

/// Fixture runner
pub struct FixtureRunner {
    /// Log every fixture, not just failures
    verbose: bool,
}

impl FixtureRunner {
    /// Create new runner
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Run every `.json` file below `dir`
    pub fn run_dir(&self, dir: &Path) -> TestResult<FixtureStats> {
        let mut stats = FixtureStats::new();
        let start = Instant::now();
        self.run_dir_recursive(dir, &mut stats)?;
        stats.duration = start.elapsed();
        Ok(stats)
    }

    fn run_dir_recursive(&self, dir: &Path, stats: &mut FixtureStats) -> TestResult<()> {
        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.run_dir_recursive(&path, stats)?;
            } else if path.extension().is_some_and(|e| e == "json") {
                match self.run_file(&path) {
                    Ok(results) => stats.add_results(&results),
                    Err(e) => {
                        warn!(file = %path.display(), %e, "unreadable fixture file");
                        stats
                            .broken_files
                            .push((path.display().to_string(), e.to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Run all fixtures in a file
    pub fn run_file(&self, path: &Path) -> TestResult<FixtureResults> {
        let content = std::fs::read_to_string(path)?;
        let fixtures: FixtureFile = serde_json::from_str(&content)?;

        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut results = FixtureResults::new(file);

        for (name, fixture) in fixtures {
            match self.run_fixture(&fixture) {
                Ok(()) => {
                    if self.verbose {
                        info!("PASS: {}", name);
                    }
                    results.passed.push(name);
                }
                Err(e) => {
                    warn!("FAIL: {} - {}", name, e);
                    results.failed.push((name, e.to_string()));
                }
            }
        }

        Ok(results)
    }

    /// Run a single fixture
    pub fn run_fixture(&self, fixture: &Fixture) -> TestResult<()> {
        let state = build_state(fixture)?;
        let env = build_environment(fixture);
        let message = build_message(&fixture.exec);

        let mut evm = Evm::new(state, env, fixture.config.clone());
        let result = evm.run_call(&message)?;
        check_result(&fixture.expect, &result, evm.state())
    }
}

fn build_state(fixture: &Fixture) -> TestResult<MemoryState> {
    let mut state = MemoryState::new();
    for (address, account) in &fixture.pre {
        state.insert_account(
            *address,
            account.balance.0,
            Bytes::copy_from_slice(&account.code.0),
        );
        if account.nonce.0 > 0 {
            let mut seeded = state.get_account(address)?.unwrap_or_default();
            seeded.nonce = account.nonce.0;
            state.put_account(*address, seeded)?;
        }
        for (key, value) in &account.storage {
            state.insert_storage(*address, key.to_h256(), value.to_h256());
        }
    }
    Ok(state)
}

fn build_environment(fixture: &Fixture) -> Environment {
    let env = &fixture.env;
    let defaults = BlockContext::default();
    let block = BlockContext {
        number: env.number.0,
        timestamp: env.timestamp.0,
        gas_limit: env.gas_limit.map_or(defaults.gas_limit, |g| g.0),
        coinbase: env.coinbase,
        prevrandao: env.prevrandao.unwrap_or(H256::ZERO),
        chain_id: env.chain_id.map_or(defaults.chain_id, |c| c.0),
        base_fee: env.base_fee.0,
        ..defaults
    };
    let tx = TxContext {
        origin: env.origin.unwrap_or(fixture.exec.caller),
        gas_price: env.gas_price.0,
        ..TxContext::default()
    };
    Environment::new(block, tx)
}

fn build_message(exec: &FixtureExec) -> Message {
    let data = Bytes::copy_from_slice(&exec.data.0);
    match exec.to {
        Some(to) => {
            let mut message = Message::call(exec.caller, to, exec.value.0, exec.gas.0, data)
                .with_static(exec.is_static);
            if let Some(code) = &exec.code {
                message = message.with_code(Bytes::copy_from_slice(&code.0));
            }
            message
        }
        None => {
            let message = Message::create(exec.caller, exec.value.0, exec.gas.0, data);
            match exec.salt {
                Some(salt) => message.with_salt(salt),
                None => message,
            }
        }
    }
}

fn mismatch(what: &str, expected: impl std::fmt::Debug, actual: impl std::fmt::Debug) -> TestError {
    TestError::Assertion(format!(
        "{} mismatch: expected {:?}, got {:?}",
        what, expected, actual
    ))
}

/// Compare the frame result and final state against the expectation
fn check_result(expect: &FixtureExpect, result: &ExecResult, state: &MemoryState) -> TestResult<()> {
    let status = match result.status {
        ExitStatus::Success => ExpectedStatus::Success,
        ExitStatus::Revert => ExpectedStatus::Revert,
        ExitStatus::Exception(_) => ExpectedStatus::Exception,
    };
    if status != expect.status {
        return Err(mismatch("status", expect.status, result.status));
    }

    if let (Some(expected), Some(halt)) = (&expect.exception, result.exception_kind()) {
        let actual = format!("{:?}", halt);
        if &actual != expected {
            return Err(mismatch("exception", expected, actual));
        }
    }

    if let Some(gas_used) = expect.gas_used {
        if result.gas_used != gas_used.0 {
            return Err(mismatch("gas used", gas_used.0, result.gas_used));
        }
    }

    if let Some(output) = &expect.output {
        if result.output.as_ref() != output.0.as_slice() {
            return Err(mismatch(
                "output",
                hex::encode(&output.0),
                hex::encode(&result.output),
            ));
        }
    }

    if expect.created_address.is_some() && expect.created_address != result.created_address {
        return Err(mismatch(
            "created address",
            expect.created_address,
            result.created_address,
        ));
    }

    if let Some(logs) = expect.logs {
        if result.logs.len() != logs {
            return Err(mismatch("log count", logs, result.logs.len()));
        }
    }

    for (address, slots) in &expect.storage {
        let actual = state.storage_of(address);
        for (key, value) in slots {
            let found = actual.get(&key.to_h256()).copied().unwrap_or(H256::ZERO);
            if found != value.to_h256() {
                return Err(mismatch(
                    &format!("storage {}[{:#x}]", address, key.0),
                    value.0,
                    found.to_word(),
                ));
            }
        }
    }

    for (address, balance) in &expect.balances {
        let actual = state.get_balance(address)?;
        if actual != balance.0 {
            return Err(mismatch(&format!("balance of {}", address), balance.0, actual));
        }
    }

    for (address, nonce) in &expect.nonces {
        let actual = state.get_nonce(address)?;
        if actual != nonce.0 {
            return Err(mismatch(&format!("nonce of {}", address), nonce.0, actual));
        }
    }

    Ok(())
}
