//! Host and site identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a host (one process in the cluster).
///
/// Only total ordering matters to the partition policy: the lowest id is
/// the blessed host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(pub u64);

/// Identifier of a site (an execution or initiator site hosted by one host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u64);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for HostId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for SiteId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Render a set of ids as `[a, b, c]` for log fields.
pub(crate) fn join_ids<'a, T, I>(ids: I) -> String
where
    T: fmt::Display + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let parts: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&HostId(7)).unwrap();
        assert_eq!(json, "7");

        let site: SiteId = serde_json::from_str("42").unwrap();
        assert_eq!(site, SiteId(42));
    }

    #[test]
    fn test_join_ids_is_ordered_for_sets() {
        let sites: BTreeSet<SiteId> = [SiteId(3), SiteId(1), SiteId(2)].into_iter().collect();
        assert_eq!(join_ids(&sites), "[1, 2, 3]");
        assert_eq!(join_ids::<SiteId, _>(&Vec::new()), "[]");
    }
}
