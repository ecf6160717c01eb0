//! CLI command implementations
//!
//! Both commands are one-shot: load configuration, do one thing, print
//! one JSON object, exit. Neither starts a fault distributor.

use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::FaultConfig;
use crate::membership::{ClusterMembership, HostId, SiteId};
use crate::partition::{test_partition_detection_directory, PartitionPolicy, SnapshotDirError};

use super::args::Command;
use super::errors::CliResult;
use super::io::{read_request_from, write_response_to};

/// Input of `decide`.
#[derive(Debug, Clone, Deserialize)]
pub struct DecideRequest {
    /// Sites newly reported failed
    pub failed_sites: BTreeSet<SiteId>,

    /// Current cluster membership
    #[serde(default)]
    pub membership: ClusterMembership,
}

/// Output of `check`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Configured local host
    pub host_id: Option<HostId>,
    /// Whether the partition policy is applied
    pub partition_detection_enabled: bool,
    /// Snapshot directory that passed the probe, if detection is on
    pub snapshot_dir: Option<PathBuf>,
    /// Snapshot file prefix
    pub snapshot_prefix: String,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { config } => check(&config),
        Command::Decide { config } => decide(&config),
    }
}

/// Validate the configuration and, when partition detection is on, the
/// snapshot directory.
pub fn check(config_path: &Path) -> CliResult<()> {
    check_to(config_path, io::stdout().lock())
}

/// `check`, writing the report to `out`.
pub fn check_to<W: Write>(config_path: &Path, out: W) -> CliResult<()> {
    let config = FaultConfig::load(config_path)?;
    let detection = &config.partition_detection;

    let snapshot_dir = if detection.enabled {
        let path = detection
            .snapshot_path
            .as_deref()
            .ok_or(SnapshotDirError::NotConfigured)?;
        test_partition_detection_directory(path)?;
        Some(path.to_path_buf())
    } else {
        None
    };

    let report = CheckReport {
        host_id: config.host_id,
        partition_detection_enabled: detection.enabled,
        snapshot_dir,
        snapshot_prefix: detection.snapshot_prefix.clone(),
    };
    write_response_to(out, &report)
}

/// Read one [`DecideRequest`] from stdin and print the partition analysis.
pub fn decide(config_path: &Path) -> CliResult<()> {
    decide_to(config_path, io::stdin().lock(), io::stdout().lock())
}

/// `decide`, reading from `input` and writing to `out`.
pub fn decide_to<R: BufRead, W: Write>(config_path: &Path, input: R, out: W) -> CliResult<()> {
    let config = FaultConfig::load(config_path)?;
    let request: DecideRequest = read_request_from(input)?;

    let policy = PartitionPolicy::new(config.partition_detection.enabled);
    let analysis = policy.evaluate(&request.failed_sites, &request.membership);
    write_response_to(out, &analysis)
}
