use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

use common::Secret;

use super::error::MonError;
use crate::api::ResourceStore;
use crate::mon::{ClusterInfo, MonitorManager};

/// Secret holding the cluster identity for internal use by the daemons.
pub const MON_SECRET_NAME: &str = "mon";
/// Secret holding the admin key for the storage class integration.
pub const ADMIN_SECRET_NAME: &str = "rook-admin";

pub const CLUSTER_NAME_KEY: &str = "clusterName";
pub const FSID_KEY: &str = "fsid";
pub const MON_SECRET_KEY: &str = "monitorSecret";
pub const ADMIN_SECRET_KEY: &str = "adminSecret";
pub const ADMIN_KEYRING_KEY: &str = "key";

pub const ROOK_SECRET_TYPE: &str = "kubernetes.io/rook";
pub const RBD_SECRET_TYPE: &str = "kubernetes.io/rbd";

/// Loads the cluster identity of a namespace, creating it the first time.
pub struct IdentityManager {
    store: Arc<dyn ResourceStore>,
    manager: Arc<dyn MonitorManager>,
    namespace: String,
    name_prefix: String,
}

impl IdentityManager {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        manager: Arc<dyn MonitorManager>,
        namespace: &str,
        name_prefix: &str,
    ) -> Self {
        Self {
            store,
            manager,
            namespace: namespace.to_string(),
            name_prefix: name_prefix.to_string(),
        }
    }

    /// Return the persisted identity, or generate and persist a new one if
    /// the namespace has none yet.
    ///
    /// A persisted identity is never regenerated: if it cannot be decoded the
    /// call fails instead.
    pub async fn resolve(&self) -> Result<ClusterInfo, MonError> {
        match self.store.get_secret(&self.namespace, MON_SECRET_NAME).await {
            Ok(secret) => {
                let info = self.parse(&secret)?;
                info!(
                    "[{}] found existing monitor secrets for cluster {} with fsid {}",
                    self.namespace, info.name, info.fsid
                );
                Ok(info)
            }
            Err(e) if e.is_not_found() => self.create_and_save().await,
            Err(source) => Err(MonError::IdentityLookup {
                namespace: self.namespace.clone(),
                name: MON_SECRET_NAME.to_string(),
                source,
            }),
        }
    }

    async fn create_and_save(&self) -> Result<ClusterInfo, MonError> {
        info!("[{}] creating mon secrets for a new cluster", self.namespace);
        let info = self
            .manager
            .create_cluster_info(&self.name_prefix)
            .map_err(|source| MonError::IdentityGeneration { source })?;

        let mut data = BTreeMap::new();
        data.insert(CLUSTER_NAME_KEY.to_string(), info.name.clone());
        data.insert(FSID_KEY.to_string(), info.fsid.clone());
        data.insert(MON_SECRET_KEY.to_string(), info.monitor_secret.clone());
        data.insert(ADMIN_SECRET_KEY.to_string(), info.admin_secret.clone());
        let secret = Secret::new(MON_SECRET_NAME, &self.namespace, ROOK_SECRET_TYPE, data);

        if let Err(e) = self.store.create_secret(&self.namespace, &secret).await {
            if !e.is_already_exists() {
                return Err(MonError::SecretPersist {
                    namespace: self.namespace.clone(),
                    name: MON_SECRET_NAME.to_string(),
                    source: e,
                });
            }
            // another controller bootstrapped first; its identity wins
            warn!(
                "[{}] mon secrets were created concurrently, discarding generated fsid {}",
                self.namespace, info.fsid
            );
            return self.load().await;
        }
        info!(
            "[{}] saved mon secrets for cluster {} with fsid {}",
            self.namespace, info.name, info.fsid
        );

        // the identity is durable now, publish the admin key
        let mut data = BTreeMap::new();
        data.insert(ADMIN_KEYRING_KEY.to_string(), info.admin_secret.clone());
        let admin = Secret::new(ADMIN_SECRET_NAME, &self.namespace, RBD_SECRET_TYPE, data);
        match self.store.create_secret(&self.namespace, &admin).await {
            Ok(()) => info!("[{}] saved {ADMIN_SECRET_NAME} secret", self.namespace),
            Err(e) if e.is_already_exists() => {
                info!("[{}] {ADMIN_SECRET_NAME} secret already exists", self.namespace)
            }
            Err(source) => {
                return Err(MonError::SecretPersist {
                    namespace: self.namespace.clone(),
                    name: ADMIN_SECRET_NAME.to_string(),
                    source,
                });
            }
        }

        Ok(info)
    }

    /// Read the persisted identity without ever creating one.
    pub async fn load(&self) -> Result<ClusterInfo, MonError> {
        let secret = self
            .store
            .get_secret(&self.namespace, MON_SECRET_NAME)
            .await
            .map_err(|source| MonError::IdentityLookup {
                namespace: self.namespace.clone(),
                name: MON_SECRET_NAME.to_string(),
                source,
            })?;
        self.parse(&secret)
    }

    fn parse(&self, secret: &Secret) -> Result<ClusterInfo, MonError> {
        let field = |key: &'static str| -> Result<String, MonError> {
            match secret.string_data.get(key) {
                Some(v) if !v.is_empty() => Ok(v.clone()),
                _ => Err(MonError::MalformedIdentity {
                    namespace: self.namespace.clone(),
                    name: secret.metadata.name.clone(),
                    field: key,
                }),
            }
        };
        Ok(ClusterInfo {
            name: field(CLUSTER_NAME_KEY)?,
            fsid: field(FSID_KEY)?,
            monitor_secret: field(MON_SECRET_KEY)?,
            admin_secret: field(ADMIN_SECRET_KEY)?,
            monitors: BTreeMap::new(),
        })
    }
}
