//! Partition Detection
//!
//! - Quorum decision for a set of newly failed sites
//! - Blessed-host tie-break for exact splits
//! - Snapshot directory precondition check
//!
//! The decision itself is pure. Latching the verdict is the fault
//! distributor's job.

mod policy;
mod snapshot_dir;

pub use policy::{analyze, decide, PartitionAnalysis, PartitionPolicy, PartitionVerdict, VerdictReason};
pub use snapshot_dir::{test_partition_detection_directory, SnapshotDirError};
