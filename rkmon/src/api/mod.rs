pub mod memory;
pub mod xlinestore;

use async_trait::async_trait;
use common::{Node, PodTask, Secret};
use std::collections::BTreeMap;

/// Label selector: every pair must be present on a matching object.
pub type LabelSelector = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },
    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: &'static str, name: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Xline(#[from] Box<etcd_client::Error>),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl From<etcd_client::Error> for StoreError {
    fn from(e: etcd_client::Error) -> Self {
        StoreError::Xline(Box::new(e))
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

/// The slice of the cluster object API the monitor controller needs.
///
/// Creates must be atomic: when two callers race on the same name exactly one
/// succeeds and the other gets [`StoreError::AlreadyExists`].
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError>;

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<(), StoreError>;

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<PodTask>, StoreError>;

    async fn create_pod(&self, namespace: &str, pod: &PodTask) -> Result<(), StoreError>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodTask, StoreError>;

    async fn list_nodes(&self) -> Result<Vec<Node>, StoreError>;
}
