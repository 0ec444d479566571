use std::sync::{Arc, Once};
use std::time::Duration;

use common::PodPhase;
use rkmon::api::memory::{Faults, MemoryStore};
use rkmon::mon::KeyringManager;
use rkmon::operator::identity::{ADMIN_SECRET_NAME, FSID_KEY, MON_SECRET_NAME};
use rkmon::operator::pod::MON_CLUSTER_LABEL;
use rkmon::operator::{Cluster, MonError, Phase};
use rkmon::protocol::config::PollConfig;

const NS: &str = "rook";

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .target(env_logger::Target::Stdout)
            .is_test(true)
            .try_init();
    });
}

fn cluster(store: &Arc<MemoryStore>) -> Cluster {
    init_logging();
    let mut cluster = Cluster::new(
        NS,
        store.clone(),
        Arc::new(KeyringManager::default()),
        "v0.3.0",
    );
    cluster.poll = PollConfig {
        interval: Duration::from_millis(1),
        max_attempts: 15,
    };
    cluster
}

#[tokio::test]
async fn test_start_from_empty_namespace() {
    let store = Arc::new(MemoryStore::new().with_nodes(3).running_after_polls(3));
    let info = cluster(&store).start().await.expect("start failed");

    assert!(!info.fsid.is_empty());
    assert_eq!(store.created_pods(), ["mon0", "mon1", "mon2"]);
    // each mon needed three polls, well under the bound
    assert_eq!(store.pod_fetches(), 9);

    assert_eq!(info.monitors.len(), 3);
    for (i, (name, mon)) in info.monitors.iter().enumerate() {
        assert_eq!(name, &format!("mon{i}"));
        assert_eq!(mon.address, format!("10.244.0.{}", 10 + i));
        assert_eq!(mon.port, 6790);
    }

    let secret = store.secret(NS, MON_SECRET_NAME).unwrap();
    assert_eq!(secret.string_data[FSID_KEY], info.fsid);
    assert!(store.secret(NS, ADMIN_SECRET_NAME).is_some());

    let pod = store.pod(NS, "mon1").unwrap();
    assert_eq!(pod.status.phase, PodPhase::Running);
    assert_eq!(pod.metadata.labels[MON_CLUSTER_LABEL], info.name);
    // enough nodes: spread one mon per node
    assert!(pod.spec.affinity.is_some());
}

#[tokio::test]
async fn test_small_cluster_allows_colocation() {
    let store = Arc::new(MemoryStore::new().with_nodes(2));
    cluster(&store).start().await.unwrap();

    for name in ["mon0", "mon1", "mon2"] {
        assert!(store.pod(NS, name).unwrap().spec.affinity.is_none());
    }
}

#[tokio::test]
async fn test_restart_is_idempotent() {
    let store = Arc::new(MemoryStore::new().with_nodes(3));
    let cluster = cluster(&store);

    let first = cluster.start().await.unwrap();
    let writes = store.writes();
    let fetches = store.pod_fetches();

    let second = cluster.start().await.unwrap();
    assert_eq!(first, second);
    // nothing new written, nothing polled, no create attempted again
    assert_eq!(store.writes(), writes);
    assert_eq!(store.pod_fetches(), fetches);
    assert_eq!(store.created_pods().len(), 3);
}

#[tokio::test]
async fn test_resume_after_partial_start() {
    let store = Arc::new(MemoryStore::new().with_nodes(3));
    let mut partial = cluster(&store);
    partial.size = 1;
    let first = partial.start().await.unwrap();
    assert_eq!(first.monitors.len(), 1);

    let info = cluster(&store).start().await.unwrap();
    assert_eq!(info.fsid, first.fsid);
    assert_eq!(info.monitors.len(), 3);
    assert_eq!(info.monitors["mon0"], first.monitors["mon0"]);
    // mon0 was offered again and rejected as existing
    assert_eq!(store.created_pods(), ["mon0", "mon0", "mon1", "mon2"]);
}

#[tokio::test]
async fn test_node_listing_failure_keeps_identity() {
    let store = Arc::new(MemoryStore::new().with_faults(Faults {
        list_nodes: true,
        ..Default::default()
    }));
    let err = cluster(&store).start().await.unwrap_err();

    assert!(matches!(err, MonError::NodeListing { .. }));
    assert_eq!(err.phase(), Phase::Placement);
    // identity was persisted before the failure and is not rolled back
    assert!(store.secret(NS, MON_SECRET_NAME).is_some());
    assert!(store.created_pods().is_empty());
}

#[tokio::test]
async fn test_stuck_mon_fails_start() {
    let store = Arc::new(MemoryStore::new().with_nodes(3).never_running());
    let err = cluster(&store).start().await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.resource_name(), Some("mon0"));
    assert_eq!(store.pod_fetches(), 15);
}

#[tokio::test]
async fn test_mon_pod_counts() {
    let store = Arc::new(MemoryStore::new().with_nodes(3));
    let cluster = cluster(&store);

    let info = cluster.start().await.unwrap();
    let counts = cluster.get_mon_pods_running(&info.name).await.unwrap();
    assert_eq!(counts, (3, 0));
    let counts = cluster.get_mon_pods_running("unknown").await.unwrap();
    assert_eq!(counts, (0, 0));
}

#[tokio::test]
async fn test_pending_mons_are_counted() {
    let store = Arc::new(MemoryStore::new().with_nodes(1).never_running());
    let mut cluster = cluster(&store);
    cluster.poll.max_attempts = 1;

    assert!(cluster.start().await.is_err());
    let name = cluster.identity().load().await.unwrap().name;
    assert_eq!(cluster.get_mon_pods_running(&name).await.unwrap(), (0, 1));
}
