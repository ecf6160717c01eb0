//! Fault values
//!
//! A fault is an immutable record of one detected problem. Identity is
//! kind-specific and deliberately narrow so repeated reports of the same
//! problem collapse into one:
//! - NodeFailure: host id
//! - SiteFailure: the (ordered) set of failed sites
//! - ClusterPartition: the underlying node failure
//! - Unknown: the description
//!
//! Detection timestamps are carried for diagnostics only and never take
//! part in equality or hashing.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::membership::ids::join_ids;
use crate::membership::{HostId, SiteId};

/// Fault kinds handlers can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FaultKind {
    /// Catch-all; also the fallback registration for kinds nobody handles
    Unknown,
    /// A whole host left the cluster
    NodeFailure,
    /// Individual sites failed
    SiteFailure,
    /// A node failure that split the cluster
    ClusterPartition,
}

impl FaultKind {
    /// Name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::NodeFailure => "NodeFailure",
            Self::SiteFailure => "SiteFailure",
            Self::ClusterPartition => "ClusterPartition",
        }
    }

    /// Every kind, in ascending order.
    pub fn all() -> &'static [FaultKind] {
        &[
            Self::Unknown,
            Self::NodeFailure,
            Self::SiteFailure,
            Self::ClusterPartition,
        ]
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host failed. Equal iff the host ids match.
#[derive(Debug, Clone)]
pub struct NodeFailureFault {
    host_id: HostId,
    failed_sites: BTreeSet<SiteId>,
    hostname: String,
    detected_at: DateTime<Utc>,
}

impl NodeFailureFault {
    /// Create a node failure with no site information.
    pub fn new(host_id: HostId, hostname: impl Into<String>) -> Self {
        Self::with_sites(host_id, BTreeSet::new(), hostname)
    }

    /// Create a node failure listing the sites that went down with the host.
    pub fn with_sites(
        host_id: HostId,
        failed_sites: BTreeSet<SiteId>,
        hostname: impl Into<String>,
    ) -> Self {
        Self {
            host_id,
            failed_sites,
            hostname: hostname.into(),
            detected_at: Utc::now(),
        }
    }

    /// Failed host.
    pub fn host_id(&self) -> HostId {
        self.host_id
    }

    /// Sites hosted by the failed host.
    pub fn failed_sites(&self) -> &BTreeSet<SiteId> {
        &self.failed_sites
    }

    /// Display name of the failed host.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// When the failure was detected.
    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }
}

impl PartialEq for NodeFailureFault {
    fn eq(&self, other: &Self) -> bool {
        self.host_id == other.host_id
    }
}

impl Eq for NodeFailureFault {}

impl Hash for NodeFailureFault {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host_id.hash(state);
    }
}

/// One or more sites failed. Equal iff the site sets match.
#[derive(Debug, Clone)]
pub struct SiteFailureFault {
    site_ids: BTreeSet<SiteId>,
    detected_at: DateTime<Utc>,
}

impl SiteFailureFault {
    /// Create a site failure for `site_ids`.
    pub fn new(site_ids: impl IntoIterator<Item = SiteId>) -> Self {
        Self {
            site_ids: site_ids.into_iter().collect(),
            detected_at: Utc::now(),
        }
    }

    /// Failed sites, ascending.
    pub fn site_ids(&self) -> &BTreeSet<SiteId> {
        &self.site_ids
    }

    /// When the failure was detected.
    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }
}

impl PartialEq for SiteFailureFault {
    fn eq(&self, other: &Self) -> bool {
        self.site_ids == other.site_ids
    }
}

impl Eq for SiteFailureFault {}

impl Hash for SiteFailureFault {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.site_ids.hash(state);
    }
}

/// A node failure that caused a partition verdict. Equal iff the causes are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterPartitionFault {
    cause: NodeFailureFault,
}

impl ClusterPartitionFault {
    /// Wrap the node failure that triggered the partition.
    pub fn new(cause: NodeFailureFault) -> Self {
        Self { cause }
    }

    /// The node failure behind the partition.
    pub fn cause(&self) -> &NodeFailureFault {
        &self.cause
    }
}

/// Fault with no specific kind. Equal iff the descriptions match.
#[derive(Debug, Clone)]
pub struct UnknownFault {
    description: String,
    detected_at: DateTime<Utc>,
}

impl UnknownFault {
    /// Create an unclassified fault.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            detected_at: Utc::now(),
        }
    }

    /// Free-form description from the detector.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for UnknownFault {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
    }
}

impl Eq for UnknownFault {}

impl Hash for UnknownFault {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.description.hash(state);
    }
}

/// A reported fault.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Unclassified fault
    Unknown(UnknownFault),
    /// Host failure
    NodeFailure(NodeFailureFault),
    /// Site failure
    SiteFailure(SiteFailureFault),
    /// Partition caused by a host failure
    ClusterPartition(ClusterPartitionFault),
}

impl Fault {
    /// Shorthand for a node failure without site information.
    pub fn node_failure(host_id: HostId, hostname: impl Into<String>) -> Self {
        Self::NodeFailure(NodeFailureFault::new(host_id, hostname))
    }

    /// Shorthand for a site failure.
    pub fn site_failure(site_ids: impl IntoIterator<Item = SiteId>) -> Self {
        Self::SiteFailure(SiteFailureFault::new(site_ids))
    }

    /// Shorthand for a partition caused by `cause`.
    pub fn cluster_partition(cause: NodeFailureFault) -> Self {
        Self::ClusterPartition(ClusterPartitionFault::new(cause))
    }

    /// Shorthand for an unclassified fault.
    pub fn unknown(description: impl Into<String>) -> Self {
        Self::Unknown(UnknownFault::new(description))
    }

    /// Kind used for handler lookup.
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Unknown(_) => FaultKind::Unknown,
            Self::NodeFailure(_) => FaultKind::NodeFailure,
            Self::SiteFailure(_) => FaultKind::SiteFailure,
            Self::ClusterPartition(_) => FaultKind::ClusterPartition,
        }
    }

    /// When the fault was detected.
    pub fn detected_at(&self) -> DateTime<Utc> {
        match self {
            Self::Unknown(f) => f.detected_at,
            Self::NodeFailure(f) => f.detected_at,
            Self::SiteFailure(f) => f.detected_at,
            Self::ClusterPartition(f) => f.cause.detected_at,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(u) => write!(f, "unknown fault: {}", u.description),
            Self::NodeFailure(n) => write!(
                f,
                "node failure: host {} ({}) sites {}",
                n.host_id,
                n.hostname,
                join_ids(&n.failed_sites)
            ),
            Self::SiteFailure(s) => write!(f, "site failure: sites {}", join_ids(&s.site_ids)),
            Self::ClusterPartition(p) => write!(
                f,
                "cluster partition caused by host {} ({})",
                p.cause.host_id, p.cause.hostname
            ),
        }
    }
}

impl From<NodeFailureFault> for Fault {
    fn from(fault: NodeFailureFault) -> Self {
        Self::NodeFailure(fault)
    }
}

impl From<SiteFailureFault> for Fault {
    fn from(fault: SiteFailureFault) -> Self {
        Self::SiteFailure(fault)
    }
}

impl From<ClusterPartitionFault> for Fault {
    fn from(fault: ClusterPartitionFault) -> Self {
        Self::ClusterPartition(fault)
    }
}
