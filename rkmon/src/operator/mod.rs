//! Bootstrap and lifecycle of the monitor quorum.
//!
//! [`Cluster::start`] resolves the cluster identity, decides placement from
//! the node count and then brings the monitor pods up one by one.

pub mod cluster;
pub mod error;
pub mod identity;
pub mod launcher;
pub mod placement;
pub mod pod;
pub mod poller;

pub use cluster::Cluster;
pub use error::{MonError, Phase};
