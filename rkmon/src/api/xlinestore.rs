use async_trait::async_trait;
use common::{Node, PodTask, Secret};
use etcd_client::{Client, Compare, CompareOp, ConnectOptions, GetOptions, Txn, TxnOp};
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{LabelSelector, ResourceStore, StoreError};
use crate::protocol::config::XlineConfig;

/// like etcd, k:{prefix}/pods/namespace/pod_name v:yaml file of pod
/// k:{prefix}/nodes/node_name v:yaml file of node
/// k:{prefix}/secrets/namespace/secret_name v:yaml file of secret
#[derive(Clone)]
pub struct XlineStore {
    client: Arc<RwLock<Client>>,
    prefix: String,
}

impl XlineStore {
    pub async fn new(cfg: &XlineConfig) -> Result<Self, StoreError> {
        let options = match (&cfg.username, &cfg.password) {
            (Some(user), Some(password)) => Some(ConnectOptions::new().with_user(user, password)),
            _ => None,
        };
        let client = Client::connect(&cfg.endpoints, options).await?;
        Ok(Self {
            client: Arc::new(RwLock::new(client)),
            prefix: cfg.prefix.trim_end_matches('/').to_string(),
        })
    }

    fn secret_key(&self, namespace: &str, name: &str) -> String {
        format!("{}/secrets/{namespace}/{name}", self.prefix)
    }

    fn pods_prefix(&self, namespace: &str) -> String {
        format!("{}/pods/{namespace}/", self.prefix)
    }

    fn pod_key(&self, namespace: &str, name: &str) -> String {
        format!("{}{name}", self.pods_prefix(namespace))
    }

    fn nodes_prefix(&self) -> String {
        format!("{}/nodes/", self.prefix)
    }

    async fn get_object<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        key: String,
        name: &str,
    ) -> Result<T, StoreError> {
        let mut client = self.client.write().await;
        let resp = client.get(key, None).await?;
        match resp.kvs().first() {
            Some(kv) => Ok(serde_yaml::from_slice(kv.value())?),
            None => Err(StoreError::NotFound {
                kind,
                name: name.to_string(),
            }),
        }
    }

    /// Put `obj` at `key` only if the key has never been written.
    async fn create_object<T: Serialize>(
        &self,
        kind: &'static str,
        key: String,
        name: &str,
        obj: &T,
    ) -> Result<(), StoreError> {
        let yaml = serde_yaml::to_string(obj)?;
        let cmp = Compare::version(key.clone(), CompareOp::Equal, 0);
        let put_op = TxnOp::put(key.clone(), yaml, None);
        let txn = Txn::new().when([cmp]).and_then([put_op]);

        let mut client = self.client.write().await;
        let txn_resp = client.txn(txn).await?;
        if !txn_resp.succeeded() {
            return Err(StoreError::AlreadyExists {
                kind,
                name: name.to_string(),
            });
        }
        debug!("created {kind} at {key}");
        Ok(())
    }

    async fn list_objects<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        prefix: String,
    ) -> Result<Vec<T>, StoreError> {
        let mut client = self.client.write().await;
        let resp = client
            .get(prefix, Some(GetOptions::new().with_prefix()))
            .await?;
        let mut items = Vec::new();
        for kv in resp.kvs() {
            match serde_yaml::from_slice::<T>(kv.value()) {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(
                        "Ignoring bad {kind} entry {}: {e}",
                        String::from_utf8_lossy(kv.key())
                    );
                }
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl ResourceStore for XlineStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        self.get_object("secret", self.secret_key(namespace, name), name)
            .await
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<(), StoreError> {
        let name = &secret.metadata.name;
        self.create_object("secret", self.secret_key(namespace, name), name, secret)
            .await
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<PodTask>, StoreError> {
        let pods: Vec<PodTask> = self
            .list_objects("pod", self.pods_prefix(namespace))
            .await?;
        Ok(pods
            .into_iter()
            .filter(|p| p.metadata.matches_labels(selector))
            .collect())
    }

    async fn create_pod(&self, namespace: &str, pod: &PodTask) -> Result<(), StoreError> {
        let name = &pod.metadata.name;
        let mut pod = pod.clone();
        pod.metadata.namespace = namespace.to_string();
        self.create_object("pod", self.pod_key(namespace, name), name, &pod)
            .await
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodTask, StoreError> {
        self.get_object("pod", self.pod_key(namespace, name), name)
            .await
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, StoreError> {
        self.list_objects("node", self.nodes_prefix()).await
    }
}
