use log::{debug, info};
use std::sync::Arc;
use tokio::time::sleep;

use common::PodPhase;

use super::error::MonError;
use crate::api::ResourceStore;
use crate::protocol::config::PollConfig;

/// Waits for a single monitor pod to report `Running`.
pub struct ReadinessPoller {
    store: Arc<dyn ResourceStore>,
    namespace: String,
    config: PollConfig,
}

impl ReadinessPoller {
    pub fn new(store: Arc<dyn ResourceStore>, namespace: &str, config: PollConfig) -> Self {
        Self {
            store,
            namespace: namespace.to_string(),
            config,
        }
    }

    /// Poll `pod_name` until it runs and return its address.
    ///
    /// Each attempt sleeps one interval before reading the pod, so the worst
    /// case is `interval * max_attempts`. A failed read aborts immediately
    /// without consuming the remaining attempts.
    pub async fn wait(&self, pod_name: &str) -> Result<String, MonError> {
        let mut phase = PodPhase::Pending;
        for attempt in 1..=self.config.max_attempts {
            info!(
                "[{}] waiting {:?} for pod {pod_name} to start. status={phase:?}",
                self.namespace, self.config.interval
            );
            sleep(self.config.interval).await;

            let pod = self
                .store
                .get_pod(&self.namespace, pod_name)
                .await
                .map_err(|source| MonError::PodFetch {
                    name: pod_name.to_string(),
                    source,
                })?;
            phase = pod.status.phase;

            if phase == PodPhase::Running {
                match pod.status.pod_ip {
                    Some(ip) if !ip.is_empty() => {
                        info!("[{}] pod {pod_name} started at {ip}", self.namespace);
                        return Ok(ip);
                    }
                    _ => debug!(
                        "[{}] pod {pod_name} is running but has no address yet (attempt {attempt})",
                        self.namespace
                    ),
                }
            }
        }

        Err(MonError::Timeout {
            name: pod_name.to_string(),
            attempts: self.config.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::{Faults, MemoryStore};
    use crate::operator::error::Phase;
    use common::{ObjectMeta, PodStatus, PodTask};
    use std::time::Duration;

    const NS: &str = "rook";

    fn fast(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    fn pod(name: &str, status: PodStatus) -> PodTask {
        PodTask {
            api_version: "v1".to_string(),
            kind: "Pod".to_string(),
            metadata: ObjectMeta {
                name: name.to_string(),
                ..Default::default()
            },
            spec: Default::default(),
            status,
        }
    }

    #[tokio::test]
    async fn test_returns_address_once_running() {
        let store = Arc::new(MemoryStore::new().running_after_polls(4));
        store.insert_pod(NS, pod("mon0", PodStatus::default()));
        let poller = ReadinessPoller::new(store.clone(), NS, fast(15));

        let ip = poller.wait("mon0").await.unwrap();
        assert_eq!(ip, "10.244.0.10");
        // success stops the loop early
        assert_eq!(store.pod_fetches(), 4);
    }

    #[tokio::test]
    async fn test_always_pending_times_out_after_max_attempts() {
        let store = Arc::new(MemoryStore::new().never_running());
        store.insert_pod(NS, pod("mon0", PodStatus::default()));
        let poller = ReadinessPoller::new(store.clone(), NS, fast(15));

        let err = poller.wait("mon0").await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.resource_name(), Some("mon0"));
        assert_eq!(store.pod_fetches(), 15);
    }

    #[tokio::test]
    async fn test_fetch_error_aborts_immediately() {
        let store = Arc::new(MemoryStore::new().with_faults(Faults {
            get_pod: true,
            ..Default::default()
        }));
        let poller = ReadinessPoller::new(store.clone(), NS, fast(15));

        let err = poller.wait("mon0").await.unwrap_err();
        assert!(matches!(err, MonError::PodFetch { .. }));
        assert_eq!(err.phase(), Phase::Readiness);
        assert_eq!(store.pod_fetches(), 1);
    }

    #[tokio::test]
    async fn test_missing_pod_is_a_fetch_error() {
        let store = Arc::new(MemoryStore::new());
        let poller = ReadinessPoller::new(store.clone(), NS, fast(15));

        let err = poller.wait("mon9").await.unwrap_err();
        match err {
            MonError::PodFetch { name, source } => {
                assert_eq!(name, "mon9");
                assert!(source.is_not_found());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_running_without_address_keeps_polling() {
        let store = Arc::new(MemoryStore::new().never_running());
        store.insert_pod(
            NS,
            pod(
                "mon0",
                PodStatus {
                    phase: PodPhase::Running,
                    pod_ip: None,
                },
            ),
        );
        let poller = ReadinessPoller::new(store.clone(), NS, fast(3));

        let err = poller.wait("mon0").await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(store.pod_fetches(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worst_case_duration_is_bounded() {
        let store = Arc::new(MemoryStore::new().never_running());
        store.insert_pod(NS, pod("mon0", PodStatus::default()));
        let poller = ReadinessPoller::new(store.clone(), NS, PollConfig::default());

        let start = tokio::time::Instant::now();
        let err = poller.wait("mon0").await.unwrap_err();
        assert!(err.is_timeout());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(90));
        assert!(elapsed < Duration::from_secs(91));
    }
}
