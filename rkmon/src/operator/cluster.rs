use log::info;
use std::sync::Arc;

use super::error::MonError;
use super::identity::IdentityManager;
use super::launcher::MonLauncher;
use super::placement;
use super::pod::desired_mons;
use super::poller::ReadinessPoller;
use crate::api::ResourceStore;
use crate::mon::{ClusterInfo, MonitorManager};
use crate::protocol::config::{Config, DEFAULT_MON_PORT, DEFAULT_MON_SIZE, PollConfig};

/// Monitor quorum of one storage cluster.
pub struct Cluster {
    pub namespace: String,
    pub version: String,
    pub cluster_name_prefix: String,
    pub size: usize,
    pub port: u16,
    pub poll: PollConfig,
    store: Arc<dyn ResourceStore>,
    manager: Arc<dyn MonitorManager>,
}

impl Cluster {
    pub fn new(
        namespace: &str,
        store: Arc<dyn ResourceStore>,
        manager: Arc<dyn MonitorManager>,
        version: &str,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            version: version.to_string(),
            cluster_name_prefix: String::new(),
            size: DEFAULT_MON_SIZE,
            port: DEFAULT_MON_PORT,
            poll: PollConfig::default(),
            store,
            manager,
        }
    }

    pub fn from_config(
        cfg: &Config,
        store: Arc<dyn ResourceStore>,
        manager: Arc<dyn MonitorManager>,
    ) -> Self {
        Self {
            namespace: cfg.namespace.clone(),
            version: cfg.version.clone(),
            cluster_name_prefix: cfg.cluster_name_prefix.clone(),
            size: cfg.mon.size,
            port: cfg.mon.port,
            poll: cfg.mon.poll.clone().into(),
            store,
            manager,
        }
    }

    /// Resolve the cluster identity, then make sure `size` monitors run.
    ///
    /// Safe to call again after a failure: every create tolerates objects a
    /// previous run already made.
    pub async fn start(&self) -> Result<ClusterInfo, MonError> {
        info!("[{}] start running mons", self.namespace);

        let info = self.identity().resolve().await?;
        let mons = desired_mons(self.size, self.port);

        // schedule the mons on different nodes if we have enough nodes to be unique
        let anti_affinity = self.anti_affinity().await?;

        self.launcher().reconcile(info, &mons, anti_affinity).await
    }

    /// Running and pending monitor pod counts for `cluster_name`.
    pub async fn get_mon_pods_running(
        &self,
        cluster_name: &str,
    ) -> Result<(usize, usize), MonError> {
        let pods = self.launcher().poll_pods(cluster_name).await?;
        Ok((pods.running.len(), pods.pending.len()))
    }

    /// Identity resolver for this cluster's namespace.
    pub fn identity(&self) -> IdentityManager {
        IdentityManager::new(
            self.store.clone(),
            self.manager.clone(),
            &self.namespace,
            &self.cluster_name_prefix,
        )
    }

    fn launcher(&self) -> MonLauncher {
        let poller = ReadinessPoller::new(self.store.clone(), &self.namespace, self.poll);
        MonLauncher::new(
            self.store.clone(),
            self.manager.clone(),
            poller,
            &self.namespace,
            &self.version,
        )
    }

    async fn anti_affinity(&self) -> Result<bool, MonError> {
        let nodes = self
            .store
            .list_nodes()
            .await
            .map_err(|source| MonError::NodeListing { source })?;
        info!(
            "[{}] there are {} nodes available for {} monitors",
            self.namespace,
            nodes.len(),
            self.size
        );
        Ok(placement::decide(nodes.len(), self.size))
    }
}
