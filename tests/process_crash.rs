//! Process Crash Tests
//!
//! The real crash primitive aborts the process, so it can only be observed
//! from outside. Each test re-runs this test binary as a child with
//! `FAULTLINE_CRASH_CHILD` set; the child takes the fatal path and the
//! parent checks how it died.

use std::env;
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::time::Duration;

use faultline::config::PartitionDetectionConfig;
use faultline::crash::ProcessCrash;
use faultline::fault::{Fault, FaultDistributor};
use faultline::membership::HostId;

const CHILD_ENV: &str = "FAULTLINE_CRASH_CHILD";

// =============================================================================
// Test Utilities
// =============================================================================

/// Outcome of one child run
#[derive(Debug)]
struct ChildResult {
    status: ExitStatus,
    stderr: String,
}

impl ChildResult {
    /// Events logged to stderr, by name.
    fn stderr_events(&self) -> Vec<String> {
        self.stderr
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter_map(|value| value["event"].as_str().map(str::to_string))
            .collect()
    }
}

/// Re-run only `test_name` in a child process with the child flag set.
fn run_child(test_name: &str) -> ChildResult {
    let output = Command::new(env::current_exe().expect("test binary path"))
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .expect("child test process starts");

    ChildResult {
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

fn is_child() -> bool {
    env::var_os(CHILD_ENV).is_some()
}

// =============================================================================
// UNHANDLED FAULT
// =============================================================================

/// Test: with no handler registered, a reported fault aborts the process
/// after logging it as unhandled.
#[test]
fn test_unhandled_fault_aborts_process() {
    if is_child() {
        let distributor = FaultDistributor::new(
            PartitionDetectionConfig::disabled(),
            Arc::new(ProcessCrash),
        )
        .unwrap();
        distributor
            .report_fault(Fault::node_failure(HostId(2), "node-2"))
            .unwrap();
        distributor.wait_for_idle(Duration::from_secs(10));

        // Reaching this line means the crash did not happen.
        std::process::exit(0);
    }

    let result = run_child("test_unhandled_fault_aborts_process");

    assert!(!result.status.success(), "child survived: {:?}", result);
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(result.status.signal(), Some(6), "expected SIGABRT: {:?}", result);
    }

    let events = result.stderr_events();
    assert!(events.iter().any(|e| e == "FAULT_UNHANDLED"), "{:?}", result);
    assert!(events.iter().any(|e| e == "CRASH_LOCAL_NODE"), "{:?}", result);
}

/// Test: a clean child run exits successfully, so the abort above is
/// caused by the fault path and not by the harness.
#[test]
fn test_child_without_faults_exits_cleanly() {
    if is_child() {
        let distributor = FaultDistributor::new(
            PartitionDetectionConfig::disabled(),
            Arc::new(ProcessCrash),
        )
        .unwrap();
        distributor.shut_down();
        return;
    }

    let result = run_child("test_child_without_faults_exits_cleanly");
    assert!(result.status.success(), "{:?}", result);
    assert!(!result.stderr_events().iter().any(|e| e == "CRASH_LOCAL_NODE"));
}
