//! In-memory membership tracker.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{HostId, MembershipView, SiteId};

/// Site ownership plus the live host set.
///
/// Deserializes from the JSON shape used by the `decide` CLI command:
///
/// ```json
/// { "site_owners": { "100": 0, "101": 0, "200": 1 }, "alive_hosts": [0, 1] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMembership {
    /// Owning host of every known site
    #[serde(default)]
    pub site_owners: BTreeMap<SiteId, HostId>,

    /// Hosts currently alive
    #[serde(default)]
    pub alive_hosts: BTreeSet<HostId>,
}

impl ClusterMembership {
    /// Create an empty membership.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `host` owns `site` and mark the host alive.
    pub fn add_site(&mut self, site: SiteId, host: HostId) {
        self.site_owners.insert(site, host);
        self.alive_hosts.insert(host);
    }

    /// Build a membership where every host in `hosts` owns
    /// `sites_per_host` consecutive sites, numbered `host * 100 + n`.
    pub fn uniform(hosts: impl IntoIterator<Item = HostId>, sites_per_host: u64) -> Self {
        let mut membership = Self::new();
        for host in hosts {
            for n in 0..sites_per_host {
                membership.add_site(SiteId(host.0 * 100 + n), host);
            }
            membership.alive_hosts.insert(host);
        }
        membership
    }

    /// All sites owned by `host`, in ascending order.
    pub fn sites_for_host(&self, host: HostId) -> BTreeSet<SiteId> {
        self.site_owners
            .iter()
            .filter(|(_, owner)| **owner == host)
            .map(|(site, _)| *site)
            .collect()
    }

    /// Remove `host` from the live set. Returns false if it was not alive.
    ///
    /// Site ownership is kept so failed sites can still be mapped back to
    /// their host.
    pub fn mark_host_failed(&mut self, host: HostId) -> bool {
        self.alive_hosts.remove(&host)
    }

    /// Whether `host` is currently alive.
    pub fn is_alive(&self, host: HostId) -> bool {
        self.alive_hosts.contains(&host)
    }
}

impl MembershipView for ClusterMembership {
    fn owner_host_of(&self, site: SiteId) -> Option<HostId> {
        self.site_owners.get(&site).copied()
    }

    fn alive_hosts(&self) -> BTreeSet<HostId> {
        self.alive_hosts.clone()
    }
}
