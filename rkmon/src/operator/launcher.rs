use log::{debug, info, warn};
use std::sync::Arc;

use common::{PodPhase, PodTask};

use super::error::MonError;
use super::pod::{MON_NODE_LABEL, MonSpec, cluster_selector, make_mon_pod};
use super::poller::ReadinessPoller;
use crate::api::ResourceStore;
use crate::mon::{ClusterInfo, MonitorManager};

/// Monitor pods of one cluster split by phase.
#[derive(Debug, Default)]
pub struct MonPods {
    pub running: Vec<PodTask>,
    pub pending: Vec<PodTask>,
}

/// Creates the monitor pods of a cluster and records where each one runs.
pub struct MonLauncher {
    store: Arc<dyn ResourceStore>,
    manager: Arc<dyn MonitorManager>,
    poller: ReadinessPoller,
    namespace: String,
    version: String,
}

impl MonLauncher {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        manager: Arc<dyn MonitorManager>,
        poller: ReadinessPoller,
        namespace: &str,
        version: &str,
    ) -> Self {
        Self {
            store,
            manager,
            poller,
            namespace: namespace.to_string(),
            version: version.to_string(),
        }
    }

    /// List the monitor pods labeled with `cluster_name`.
    pub async fn poll_pods(&self, cluster_name: &str) -> Result<MonPods, MonError> {
        let pods = self
            .store
            .list_pods(&self.namespace, &cluster_selector(cluster_name))
            .await
            .map_err(|source| MonError::PodListing {
                cluster: cluster_name.to_string(),
                source,
            })?;

        let mut classified = MonPods::default();
        for pod in pods {
            let has_address = matches!(pod.status.pod_ip.as_deref(), Some(ip) if !ip.is_empty());
            match pod.status.phase {
                PodPhase::Running if has_address => classified.running.push(pod),
                // running without an address is not ready yet
                PodPhase::Running | PodPhase::Pending => classified.pending.push(pod),
                phase => debug!(
                    "[{}] ignoring mon pod {} in phase {phase:?}",
                    self.namespace, pod.metadata.name
                ),
            }
        }
        Ok(classified)
    }

    /// Bring up `mons` in order and fill `info.monitors`.
    ///
    /// Pods are started one at a time; each create is followed by a wait for
    /// that pod before the next one is created. Pods that already exist are
    /// waited on like new ones. Nothing is rolled back on failure.
    pub async fn reconcile(
        &self,
        mut info: ClusterInfo,
        mons: &[MonSpec],
        anti_affinity: bool,
    ) -> Result<ClusterInfo, MonError> {
        let pods = self.poll_pods(&info.name).await?;
        info!(
            "[{}] {} running, {} pending pods",
            self.namespace,
            pods.running.len(),
            pods.pending.len()
        );

        info.monitors.clear();
        for pod in &pods.running {
            let name = pod
                .metadata
                .labels
                .get(MON_NODE_LABEL)
                .unwrap_or(&pod.metadata.name);
            if let Some(address) = pod.status.pod_ip.as_deref() {
                let mon = self.manager.to_monitor_config(name, address);
                info.monitors.insert(name.clone(), mon);
            }
        }

        if pods.running.len() == mons.len() {
            info!("[{}] pods are already running", self.namespace);
            return Ok(info);
        }
        if !pods.pending.is_empty() {
            warn!(
                "[{}] {} mon pods are still pending from an earlier start",
                self.namespace,
                pods.pending.len()
            );
        }

        let mut started = 0;
        let mut already_running = 0;
        for mon in mons {
            let pod = make_mon_pod(mon, &info, &self.namespace, &self.version, anti_affinity);
            debug!("[{}] starting pod: {pod:?}", self.namespace);
            match self.store.create_pod(&self.namespace, &pod).await {
                Ok(()) => started += 1,
                Err(e) if e.is_already_exists() => {
                    already_running += 1;
                    info!("[{}] mon pod {} already exists", self.namespace, mon.name);
                }
                Err(source) => {
                    return Err(MonError::PodCreate {
                        namespace: self.namespace.clone(),
                        name: mon.name.clone(),
                        source,
                    });
                }
            }

            let address = self.poller.wait(&mon.name).await?;
            info.monitors.insert(
                mon.name.clone(),
                self.manager.to_monitor_config(&mon.name, &address),
            );
        }

        info!(
            "[{}] started {}/{} mons ({} already running)",
            self.namespace,
            started + already_running,
            mons.len(),
            already_running
        );
        Ok(info)
    }
}
