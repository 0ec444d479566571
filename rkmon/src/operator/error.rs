use std::fmt;

use crate::api::StoreError;

/// Stage of `Cluster::start` an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Identity,
    Placement,
    Reconcile,
    Readiness,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Identity => "identity",
            Phase::Placement => "placement",
            Phase::Reconcile => "reconcile",
            Phase::Readiness => "readiness",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonError {
    #[error("failed to get mon secret {name} in namespace {namespace}: {source}")]
    IdentityLookup {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("mon secret {name} in namespace {namespace} is malformed: missing field {field}")]
    MalformedIdentity {
        namespace: String,
        name: String,
        field: &'static str,
    },
    #[error("failed to create mon secrets: {source}")]
    IdentityGeneration {
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to save secret {name} in namespace {namespace}: {source}")]
    SecretPersist {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to get nodes in cluster: {source}")]
    NodeListing {
        #[source]
        source: StoreError,
    },
    #[error("failed to get mon pods for cluster {cluster}: {source}")]
    PodListing {
        cluster: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to create mon pod {name} in namespace {namespace}: {source}")]
    PodCreate {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to get mon pod {name}: {source}")]
    PodFetch {
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("timed out waiting for pod {name} to start after {attempts} attempts")]
    Timeout { name: String, attempts: u32 },
}

impl MonError {
    pub fn phase(&self) -> Phase {
        match self {
            MonError::IdentityLookup { .. }
            | MonError::MalformedIdentity { .. }
            | MonError::IdentityGeneration { .. }
            | MonError::SecretPersist { .. } => Phase::Identity,
            MonError::NodeListing { .. } => Phase::Placement,
            MonError::PodListing { .. } | MonError::PodCreate { .. } => Phase::Reconcile,
            MonError::PodFetch { .. } | MonError::Timeout { .. } => Phase::Readiness,
        }
    }

    /// Name of the object the failing operation was about, if any.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            MonError::IdentityLookup { name, .. }
            | MonError::MalformedIdentity { name, .. }
            | MonError::SecretPersist { name, .. }
            | MonError::PodCreate { name, .. }
            | MonError::PodFetch { name, .. }
            | MonError::Timeout { name, .. } => Some(name),
            MonError::PodListing { cluster, .. } => Some(cluster),
            MonError::IdentityGeneration { .. } | MonError::NodeListing { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, MonError::Timeout { .. })
    }
}
