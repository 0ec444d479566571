use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

use rkmon::api::ResourceStore;
use rkmon::api::xlinestore::XlineStore;
use rkmon::mon::{KeyringManager, MonitorManager};
use rkmon::operator::identity::{IdentityManager, MON_SECRET_NAME};
use rkmon::operator::pod::{MonSpec, cluster_selector, make_mon_pod};
use rkmon::protocol::config::{XlineConfig, load_config};

fn xline_config() -> XlineConfig {
    let config_path = std::env::var("TEST_CONFIG_PATH").unwrap_or_else(|_| {
        format!(
            "{}/tests/config.yaml",
            std::env::var("CARGO_MANIFEST_DIR").unwrap()
        )
    });
    match load_config(&config_path) {
        Ok(config) => config.xline_config,
        Err(_) => XlineConfig {
            endpoints: vec!["127.0.0.1:2379".to_string()],
            prefix: "/registry".to_string(),
            username: None,
            password: None,
        },
    }
}

fn unique_namespace(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos();
    format!("rkmon-test-{tag}-{nanos}")
}

#[tokio::test]
#[serial]
#[ignore = "requires a running xline at the endpoints in tests/config.yaml"]
async fn test_secret_create_is_exclusive() {
    let store = XlineStore::new(&xline_config()).await.expect("connect xline");
    let store = Arc::new(store);
    let ns = unique_namespace("ids");
    let ids = IdentityManager::new(store.clone(), Arc::new(KeyringManager::default()), &ns, "");

    let first = ids.resolve().await.expect("first resolve");
    let second = ids.resolve().await.expect("second resolve");
    assert_eq!(first, second);

    let secret = store.get_secret(&ns, MON_SECRET_NAME).await.unwrap();
    let err = store.create_secret(&ns, &secret).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
#[serial]
#[ignore = "requires a running xline at the endpoints in tests/config.yaml"]
async fn test_pod_round_trip() {
    let store = XlineStore::new(&xline_config()).await.expect("connect xline");
    let ns = unique_namespace("pods");
    let info = KeyringManager::default().create_cluster_info(&ns).unwrap();
    let mon = MonSpec {
        name: format!("{ns}-mon0"),
        port: 6790,
    };
    let pod = make_mon_pod(&mon, &info, &ns, "latest", false);

    store.create_pod(&ns, &pod).await.expect("create pod");
    let err = store.create_pod(&ns, &pod).await.unwrap_err();
    assert!(err.is_already_exists());

    let fetched = store.get_pod(&ns, &mon.name).await.expect("get pod");
    assert_eq!(fetched.metadata.labels, pod.metadata.labels);

    let listed = store
        .list_pods(&ns, &cluster_selector(&info.name))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let err = store.get_pod("elsewhere", &mon.name).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[serial]
#[ignore = "requires a running xline at the endpoints in tests/config.yaml"]
async fn test_same_pod_name_in_two_namespaces() {
    let store = XlineStore::new(&xline_config()).await.expect("connect xline");
    let ns_a = unique_namespace("a");
    let ns_b = unique_namespace("b");
    let info = KeyringManager::default().create_cluster_info("").unwrap();
    let mon = MonSpec {
        name: "mon0".to_string(),
        port: 6790,
    };

    for ns in [&ns_a, &ns_b] {
        let pod = make_mon_pod(&mon, &info, ns, "latest", false);
        store.create_pod(ns, &pod).await.expect("create pod");
    }

    let a = store
        .get_pod(&ns_a, "mon0")
        .await
        .expect("get pod in first namespace");
    let b = store
        .get_pod(&ns_b, "mon0")
        .await
        .expect("get pod in second namespace");
    assert_eq!(a.metadata.namespace, ns_a);
    assert_eq!(b.metadata.namespace, ns_b);

    let listed = store
        .list_pods(&ns_a, &cluster_selector(&info.name))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].metadata.namespace, ns_a);
}
