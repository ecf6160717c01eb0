//! Fault handler capability
//!
//! Handlers are invoked from the dispatch worker with every fault of one
//! kind from a dispatch round that they have not yet acknowledged. A handler
//! acknowledges either while it runs (through [`FaultBatch::acknowledge`]) or
//! later from any thread (through `FaultDistributor::report_fault_handled`).
//! Acknowledged faults are not delivered to that handler again until they
//! are cleared.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use super::errors::HandlerResult;
use super::types::{Fault, FaultKind};

/// Handler priorities used by the node's built-in handlers.
///
/// Lower values run first.
pub mod priority {
    /// Catalog update; must run before anything else reacts to a dead host
    pub const NODE_FAILURE_CATALOG: i32 = 1;
    /// Transaction initiators drop the failed sites
    pub const NODE_FAILURE_INITIATOR: i32 = 100;
    /// Execution sites run failure agreement
    pub const NODE_FAILURE_EXECUTION_SITE: i32 = 200;
    /// Partition snapshot before the deliberate crash
    pub const CLUSTER_PARTITION_SNAPSHOT: i32 = 300;
    /// Default handlers registered under `Unknown`
    pub const DEFAULT_HANDLER: i32 = i32::MAX;
}

/// Identifier of one registration, returned by `register_fault_handler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(pub(crate) u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// The faults one handler receives in one dispatch round.
pub struct FaultBatch<'a> {
    handler_id: HandlerId,
    kind: FaultKind,
    faults: &'a HashSet<Fault>,
    acknowledged: RefCell<Vec<Fault>>,
}

impl<'a> FaultBatch<'a> {
    pub(crate) fn new(handler_id: HandlerId, kind: FaultKind, faults: &'a HashSet<Fault>) -> Self {
        Self {
            handler_id,
            kind,
            faults,
            acknowledged: RefCell::new(Vec::new()),
        }
    }

    /// Registration receiving this batch.
    pub fn handler_id(&self) -> HandlerId {
        self.handler_id
    }

    /// Kind of every fault in the batch. For faults delivered through the
    /// `Unknown` fallback this is still the fault's own kind.
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// The faults, deduplicated.
    pub fn faults(&self) -> &HashSet<Fault> {
        self.faults
    }

    /// Iterate the faults.
    pub fn iter(&self) -> impl Iterator<Item = &Fault> {
        self.faults.iter()
    }

    /// Number of faults in the batch.
    pub fn len(&self) -> usize {
        self.faults.len()
    }

    /// Whether the batch is empty. Batches handed to handlers never are.
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    /// Mark `fault` as handled by this registration.
    pub fn acknowledge(&self, fault: &Fault) {
        self.acknowledged.borrow_mut().push(fault.clone());
    }

    /// Mark every fault in the batch as handled.
    pub fn acknowledge_all(&self) {
        self.acknowledged
            .borrow_mut()
            .extend(self.faults.iter().cloned());
    }

    pub(crate) fn into_acknowledged(self) -> Vec<Fault> {
        self.acknowledged.into_inner()
    }
}

/// A component interested in faults.
pub trait FaultHandler: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// New faults of one kind.
    ///
    /// Returning an error is fatal: the distributor logs it and crashes the
    /// local node.
    fn fault_occurred(&self, batch: &FaultBatch<'_>) -> HandlerResult<()>;

    /// Faults of one kind that are no longer in effect (for example, a
    /// failed host rejoined).
    fn fault_cleared(&self, _batch: &FaultBatch<'_>) -> HandlerResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::HostId;

    #[test]
    fn test_batch_collects_acknowledgements() {
        let faults: HashSet<Fault> = [
            Fault::node_failure(HostId(1), "a"),
            Fault::node_failure(HostId(2), "b"),
        ]
        .into_iter()
        .collect();
        let batch = FaultBatch::new(HandlerId(1), FaultKind::NodeFailure, &faults);

        batch.acknowledge(&Fault::node_failure(HostId(1), "a"));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.into_acknowledged().len(), 1);
    }

    #[test]
    fn test_acknowledge_all() {
        let faults: HashSet<Fault> = [Fault::unknown("x"), Fault::unknown("y")]
            .into_iter()
            .collect();
        let batch = FaultBatch::new(HandlerId(1), FaultKind::Unknown, &faults);

        batch.acknowledge_all();
        let acked: HashSet<Fault> = batch.into_acknowledged().into_iter().collect();
        assert_eq!(acked, faults);
    }

    #[test]
    fn test_priorities_are_ordered() {
        assert!(priority::NODE_FAILURE_CATALOG < priority::NODE_FAILURE_INITIATOR);
        assert!(priority::NODE_FAILURE_INITIATOR < priority::NODE_FAILURE_EXECUTION_SITE);
        assert!(priority::CLUSTER_PARTITION_SNAPSHOT < priority::DEFAULT_HANDLER);
    }

    #[test]
    fn test_handler_id_display() {
        assert_eq!(HandlerId(4).to_string(), "handler-4");
    }
}
