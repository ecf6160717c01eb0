//! Partition policy decision
//!
//! Decides whether the hosts that remain reachable from this node may keep
//! running after a failure, or whether this node is on the losing side of a
//! network split and must stop.
//!
//! - More than half the previous cluster failed: this side is a minority.
//! - Exactly half failed: the side holding the lowest host id (the blessed
//!   host) continues, the other side stops.
//! - Otherwise this side is a majority and continues.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::membership::ids::join_ids;
use crate::membership::{HostId, MembershipView, SiteId};
use crate::observability::Logger;

/// Outcome of a partition policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionVerdict {
    /// Ordinary node failure; keep running
    NodeFailure,
    /// This side lost the split; stop processing faults and shut down
    PartitionDetection,
}

impl PartitionVerdict {
    /// Name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeFailure => "NodeFailure",
            Self::PartitionDetection => "PartitionDetection",
        }
    }

    /// Whether the verdict requires the local node to stop.
    pub fn is_partition(&self) -> bool {
        matches!(self, Self::PartitionDetection)
    }
}

/// Which rule produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictReason {
    /// Partition detection is turned off
    PolicyDisabled,
    /// No failed host could be identified
    NoFailedSites,
    /// Fewer than half the hosts failed
    MajoritySurvives,
    /// Exact split, and the blessed host is on this side
    BlessedHalfSurvives,
    /// Exact split, and the blessed host failed
    BlessedHostFailed,
    /// More than half the hosts failed
    MinoritySurvives,
}

/// Verdict plus the inputs that led to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionAnalysis<H> {
    /// The decision
    pub verdict: PartitionVerdict,
    /// Rule that produced it
    pub reason: VerdictReason,
    /// Hosts owning the newly failed sites
    pub failed_hosts: BTreeSet<H>,
    /// Alive hosts that are not in `failed_hosts`
    pub surviving_hosts: BTreeSet<H>,
    /// Cluster size before this failure
    pub previous_cluster_size: usize,
    /// Lowest host id across survivors and failed hosts
    pub blessed_host: Option<H>,
    /// Whether the blessed host is among the failed
    pub blessed_host_failed: bool,
}

impl<H> PartitionAnalysis<H> {
    fn trivial(reason: VerdictReason) -> Self {
        Self {
            verdict: PartitionVerdict::NodeFailure,
            reason,
            failed_hosts: BTreeSet::new(),
            surviving_hosts: BTreeSet::new(),
            previous_cluster_size: 0,
            blessed_host: None,
            blessed_host_failed: false,
        }
    }
}

/// Apply the quorum rule to a set of failed hosts and the hosts still alive.
///
/// Hosts present in both sets count as failed. Host ids only need a total
/// order.
pub fn analyze<H: Ord + Clone>(
    failed_hosts: &BTreeSet<H>,
    alive_hosts: &BTreeSet<H>,
) -> PartitionAnalysis<H> {
    if failed_hosts.is_empty() {
        return PartitionAnalysis::trivial(VerdictReason::NoFailedSites);
    }

    let surviving_hosts: BTreeSet<H> = alive_hosts.difference(failed_hosts).cloned().collect();
    let previous_cluster_size = surviving_hosts.len() + failed_hosts.len();

    let blessed_host = match (failed_hosts.first(), surviving_hosts.first()) {
        (Some(f), Some(s)) => Some(if f < s { f.clone() } else { s.clone() }),
        (Some(f), None) => Some(f.clone()),
        (None, s) => s.cloned(),
    };
    let blessed_host_failed = blessed_host
        .as_ref()
        .map(|host| failed_hosts.contains(host))
        .unwrap_or(false);

    let doubled_failures = failed_hosts.len() * 2;
    let (verdict, reason) = if doubled_failures == previous_cluster_size {
        if blessed_host_failed {
            (PartitionVerdict::PartitionDetection, VerdictReason::BlessedHostFailed)
        } else {
            (PartitionVerdict::NodeFailure, VerdictReason::BlessedHalfSurvives)
        }
    } else if doubled_failures > previous_cluster_size {
        (PartitionVerdict::PartitionDetection, VerdictReason::MinoritySurvives)
    } else {
        (PartitionVerdict::NodeFailure, VerdictReason::MajoritySurvives)
    };

    PartitionAnalysis {
        verdict,
        reason,
        failed_hosts: failed_hosts.clone(),
        surviving_hosts,
        previous_cluster_size,
        blessed_host,
        blessed_host_failed,
    }
}

/// Verdict only; see [`analyze`].
pub fn decide<H: Ord + Clone>(
    failed_hosts: &BTreeSet<H>,
    alive_hosts: &BTreeSet<H>,
) -> PartitionVerdict {
    analyze(failed_hosts, alive_hosts).verdict
}

/// The partition policy with its configuration applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPolicy {
    enabled: bool,
}

impl PartitionPolicy {
    /// Create a policy. A disabled policy always answers `NodeFailure`.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether partition detection is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Evaluate newly failed sites against the current membership.
    ///
    /// Sites the membership does not know are skipped with a warning.
    pub fn evaluate<V: MembershipView + ?Sized>(
        &self,
        failed_sites: &BTreeSet<SiteId>,
        view: &V,
    ) -> PartitionAnalysis<HostId> {
        if !self.enabled {
            return PartitionAnalysis::trivial(VerdictReason::PolicyDisabled);
        }
        if failed_sites.is_empty() {
            return PartitionAnalysis::trivial(VerdictReason::NoFailedSites);
        }

        let mut failed_hosts = BTreeSet::new();
        let mut unknown_sites = BTreeSet::new();
        for site in failed_sites {
            match view.owner_host_of(*site) {
                Some(host) => {
                    failed_hosts.insert(host);
                }
                None => {
                    unknown_sites.insert(*site);
                }
            }
        }
        if !unknown_sites.is_empty() {
            Logger::warn(
                "PARTITION_UNKNOWN_SITES",
                &[("sites", &join_ids(&unknown_sites))],
            );
        }

        analyze(&failed_hosts, &view.alive_hosts())
    }
}
