//! In-process [`ResourceStore`] for tests and local dry runs.
//!
//! Pods are created `Pending` and flip to `Running` (with an address out of
//! `10.244.0.0/24`) after a configurable number of status reads, which is
//! enough to exercise the readiness poller without a scheduler or kubelet.

use async_trait::async_trait;
use common::{Node, NodeSpec, NodeStatus, ObjectMeta, PodPhase, PodTask, Secret};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{LabelSelector, ResourceStore, StoreError};

#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub list_nodes: bool,
    pub list_pods: bool,
    pub get_pod: bool,
    pub create_pod: bool,
    pub get_secret: bool,
    /// Fail every secret create whose name matches.
    pub create_secret: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
enum Readiness {
    /// Running after this many `get_pod` calls on the pod.
    AfterPolls(u32),
    Never,
}

#[derive(Default)]
struct State {
    secrets: HashMap<(String, String), Secret>,
    pods: HashMap<(String, String), PodTask>,
    // get_pod calls seen per pod
    polls: HashMap<(String, String), u32>,
    nodes: Vec<Node>,
    next_ip: u8,
    writes: usize,
    created_pods: Vec<String>,
    pod_fetches: usize,
}

pub struct MemoryStore {
    state: Mutex<State>,
    readiness: Readiness,
    faults: Faults,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Pods become Running on their first status read.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_ip: 10,
                ..Default::default()
            }),
            readiness: Readiness::AfterPolls(1),
            faults: Faults::default(),
        }
    }

    pub fn with_nodes(self, count: usize) -> Self {
        {
            let mut state = self.lock();
            state.nodes = (0..count)
                .map(|i| make_node(&format!("node-{i}")))
                .collect();
        }
        self
    }

    pub fn running_after_polls(mut self, polls: u32) -> Self {
        self.readiness = Readiness::AfterPolls(polls.max(1));
        self
    }

    pub fn never_running(mut self) -> Self {
        self.readiness = Readiness::Never;
        self
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    /// Seed an object without counting it as a write.
    pub fn insert_secret(&self, namespace: &str, secret: Secret) {
        let key = (namespace.to_string(), secret.metadata.name.clone());
        self.lock().secrets.insert(key, secret);
    }

    /// Seed a pod as-is (phase and address included) without counting a write.
    pub fn insert_pod(&self, namespace: &str, mut pod: PodTask) {
        pod.metadata.namespace = namespace.to_string();
        let key = (namespace.to_string(), pod.metadata.name.clone());
        self.lock().pods.insert(key, pod);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.lock()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn pod(&self, namespace: &str, name: &str) -> Option<PodTask> {
        self.lock()
            .pods
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Successful creates of any kind.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Names passed to `create_pod`, in call order, including rejected ones.
    pub fn created_pods(&self) -> Vec<String> {
        self.lock().created_pods.clone()
    }

    pub fn pod_fetches(&self) -> usize {
        self.lock().pod_fetches
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // a panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn make_node(name: &str) -> Node {
    Node {
        api_version: "v1".to_string(),
        kind: "Node".to_string(),
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: String::new(),
            ..Default::default()
        },
        spec: NodeSpec {
            pod_cidr: "10.244.0.0/24".to_string(),
        },
        status: NodeStatus {
            capacity: HashMap::new(),
            allocatable: HashMap::new(),
            addresses: Vec::new(),
            conditions: Vec::new(),
        },
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Unavailable(format!("injected failure in {op}"))
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        if self.faults.get_secret {
            return Err(injected("get_secret"));
        }
        let found = self.secret(namespace, name);
        // let concurrent callers interleave between a read and their next write
        tokio::task::yield_now().await;
        found.ok_or_else(|| StoreError::NotFound {
            kind: "secret",
            name: name.to_string(),
        })
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<(), StoreError> {
        let name = &secret.metadata.name;
        if self.faults.create_secret == Some(name.as_str()) {
            return Err(injected("create_secret"));
        }
        let mut state = self.lock();
        let key = (namespace.to_string(), name.clone());
        if state.secrets.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: "secret",
                name: name.clone(),
            });
        }
        state.secrets.insert(key, secret.clone());
        state.writes += 1;
        Ok(())
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<PodTask>, StoreError> {
        if self.faults.list_pods {
            return Err(injected("list_pods"));
        }
        let state = self.lock();
        let mut pods: Vec<PodTask> = state
            .pods
            .iter()
            .filter(|((ns, _), p)| ns == namespace && p.metadata.matches_labels(selector))
            .map(|(_, p)| p.clone())
            .collect();
        pods.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(pods)
    }

    async fn create_pod(&self, namespace: &str, pod: &PodTask) -> Result<(), StoreError> {
        let name = pod.metadata.name.clone();
        let mut state = self.lock();
        state.created_pods.push(name.clone());
        if self.faults.create_pod {
            return Err(injected("create_pod"));
        }
        let key = (namespace.to_string(), name.clone());
        if state.pods.contains_key(&key) {
            return Err(StoreError::AlreadyExists { kind: "pod", name });
        }
        let mut pod = pod.clone();
        pod.metadata.namespace = namespace.to_string();
        pod.status = Default::default();
        state.pods.insert(key, pod);
        state.writes += 1;
        Ok(())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodTask, StoreError> {
        let mut state = self.lock();
        state.pod_fetches += 1;
        if self.faults.get_pod {
            return Err(injected("get_pod"));
        }
        let key = (namespace.to_string(), name.to_string());
        let polls = {
            let count = state.polls.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let ready = match self.readiness {
            Readiness::AfterPolls(n) => polls >= n,
            Readiness::Never => false,
        };
        let next_ip = state.next_ip;
        let Some(pod) = state.pods.get_mut(&key) else {
            return Err(StoreError::NotFound {
                kind: "pod",
                name: name.to_string(),
            });
        };
        let mut assigned = false;
        if ready && pod.status.phase == PodPhase::Pending {
            pod.status.phase = PodPhase::Running;
            pod.status.pod_ip = Some(format!("10.244.0.{next_ip}"));
            assigned = true;
        }
        let pod = pod.clone();
        if assigned {
            state.next_ip = state.next_ip.wrapping_add(1);
        }
        Ok(pod)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, StoreError> {
        if self.faults.list_nodes {
            return Err(injected("list_nodes"));
        }
        Ok(self.lock().nodes.clone())
    }
}
