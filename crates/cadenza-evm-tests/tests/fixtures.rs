//! Runs every JSON fixture shipped with the crate

use cadenza_evm_tests::{FixtureRunner, TestError};
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn all_fixtures_pass() {
    init_tracing();
    let stats = FixtureRunner::new(true).run_dir(&fixtures_dir()).unwrap();
    if !stats.all_passed() {
        stats.print_summary();
    }
    assert!(stats.total >= 20, "only {} fixtures found", stats.total);
    assert!(stats.all_passed());
}

#[test]
fn each_file_parses() {
    let runner = FixtureRunner::new(false);
    for name in ["arithmetic", "calls", "precompiles", "storage"] {
        let path = fixtures_dir().join(format!("{name}.json"));
        let results = runner.run_file(&path).unwrap();
        assert!(results.total() > 0, "{name} is empty");
    }
}

#[test]
fn missing_file_is_io_error() {
    let err = FixtureRunner::new(false)
        .run_file(&fixtures_dir().join("does_not_exist.json"))
        .unwrap_err();
    assert!(matches!(err, TestError::Io(_)));
}
