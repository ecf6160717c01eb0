//! Fault Distribution
//!
//! Components report faults (a node died, sites failed, the cluster split);
//! the distributor delivers them asynchronously to the handlers registered
//! for each kind, lowest priority first.
//!
//! Guarantees:
//! - Reporting never blocks on a handler
//! - Exactly one dispatch worker per distributor, so handlers never overlap
//! - A fault equal to one already acknowledged by a handler is not
//!   delivered to that handler again until it is cleared
//! - A kind with no handler falls back to `Unknown` handlers, then to a
//!   default handler that crashes the node
//! - Once a partition is detected nothing is dispatched again
//! - A handler error or panic crashes the node

mod default_handler;
mod distributor;
mod errors;
mod handler;
mod queue;
mod registry;
mod types;

pub use default_handler::DefaultFaultHandler;
pub use distributor::{DispatchState, FaultDistributor};
pub use errors::{FaultError, FaultResult, HandlerResult};
pub use handler::{priority, FaultBatch, FaultHandler, HandlerId};
pub use queue::{FaultEvent, PendingFaultQueue, WaitOutcome};
pub use registry::{HandlerRegistry, RegisteredHandler};
pub use types::{
    ClusterPartitionFault, Fault, FaultKind, NodeFailureFault, SiteFailureFault, UnknownFault,
};
