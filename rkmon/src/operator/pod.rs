use std::collections::{BTreeMap, HashMap};

use common::{
    Affinity, ContainerSpec, ObjectMeta, PodAffinityTerm, PodAntiAffinity, PodSpec, PodTask, Port,
};

use super::identity::MON_SECRET_NAME;
use crate::api::LabelSelector;
use crate::mon::ClusterInfo;

pub const APP_NAME: &str = "mon";
pub const APP_LABEL: &str = "app";
pub const MON_NODE_LABEL: &str = "mon_node";
pub const MON_CLUSTER_LABEL: &str = "mon_cluster";
pub const HOSTNAME_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";
pub const MON_IMAGE: &str = "rook/rookd";

/// One desired monitor daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonSpec {
    pub name: String,
    pub port: u16,
}

/// `size` monitors named `mon0..mon{size-1}`, all on `port`.
pub fn desired_mons(size: usize, port: u16) -> Vec<MonSpec> {
    (0..size)
        .map(|i| MonSpec {
            name: format!("mon{i}"),
            port,
        })
        .collect()
}

/// Labels shared by every monitor pod of a cluster.
pub fn cluster_selector(cluster_name: &str) -> LabelSelector {
    let mut selector = BTreeMap::new();
    selector.insert(APP_LABEL.to_string(), APP_NAME.to_string());
    selector.insert(MON_CLUSTER_LABEL.to_string(), cluster_name.to_string());
    selector
}

pub fn make_mon_pod(
    mon: &MonSpec,
    info: &ClusterInfo,
    namespace: &str,
    version: &str,
    anti_affinity: bool,
) -> PodTask {
    let selector = cluster_selector(&info.name);
    let mut labels: HashMap<String, String> = selector.clone().into_iter().collect();
    labels.insert(MON_NODE_LABEL.to_string(), mon.name.clone());

    let container = ContainerSpec {
        name: APP_NAME.to_string(),
        image: format!("{MON_IMAGE}:{version}"),
        ports: vec![Port {
            container_port: i32::from(mon.port),
            protocol: "TCP".to_string(),
            host_port: 0,
            host_ip: String::new(),
        }],
        args: vec![
            APP_NAME.to_string(),
            format!("--name={}", mon.name),
            format!("--port={}", mon.port),
            format!("--cluster-name={}", info.name),
            format!("--fsid={}", info.fsid),
            format!("--mon-secret-name={MON_SECRET_NAME}"),
        ],
        resources: None,
    };

    // keep monitors of the same cluster off each other's nodes
    let affinity = anti_affinity.then(|| Affinity {
        pod_anti_affinity: Some(PodAntiAffinity {
            required: vec![PodAffinityTerm {
                match_labels: selector,
                topology_key: HOSTNAME_TOPOLOGY_KEY.to_string(),
            }],
        }),
    });

    PodTask {
        api_version: "v1".to_string(),
        kind: "Pod".to_string(),
        metadata: ObjectMeta {
            name: mon.name.clone(),
            namespace: namespace.to_string(),
            labels,
            annotations: HashMap::new(),
        },
        spec: PodSpec {
            node_name: None,
            containers: vec![container],
            init_containers: vec![],
            affinity,
        },
        status: Default::default(),
    }
}
