//! faultline - fault distribution and partition detection for a clustered node
//!
//! - `fault`: the asynchronous fault bus and its handler registry
//! - `partition`: quorum decision after node failures
//! - `membership`: the cluster view the decision reads
//! - `crash`: the local node crash primitive

pub mod cli;
pub mod config;
pub mod crash;
pub mod fault;
pub mod membership;
pub mod observability;
pub mod partition;
