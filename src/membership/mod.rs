//! Cluster Membership
//!
//! The fault distributor does not track membership itself. It consumes a
//! view of the cluster through [`MembershipView`]:
//! - which host owns a given site
//! - which hosts are still alive
//!
//! [`ClusterMembership`] is a plain in-memory implementation used by the CLI
//! and by tests. Production deployments plug in their own tracker.

pub(crate) mod ids;
mod tracker;

pub use ids::{HostId, SiteId};
pub use tracker::ClusterMembership;

use std::collections::BTreeSet;

/// Read-only view of cluster membership consumed by the partition policy.
pub trait MembershipView {
    /// Host that owns `site`, if the site is known.
    fn owner_host_of(&self, site: SiteId) -> Option<HostId>;

    /// Hosts currently believed to be alive.
    fn alive_hosts(&self) -> BTreeSet<HostId>;
}

impl<T: MembershipView + ?Sized> MembershipView for &T {
    fn owner_host_of(&self, site: SiteId) -> Option<HostId> {
        (**self).owner_host_of(site)
    }

    fn alive_hosts(&self) -> BTreeSet<HostId> {
        (**self).alive_hosts()
    }
}
