//! Local generation of cluster identity values.
//!
//! Secrets use the Ceph key encoding so the monitor daemons accept them as-is:
//! a little-endian header (`u16` key type, `u32` seconds, `u32` nanoseconds,
//! `u16` key length) followed by the raw key, all base64 encoded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use rand::Rng;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{ClusterInfo, MonitorConfig, MonitorManager};
use crate::protocol::config::DEFAULT_MON_PORT;

pub const DEFAULT_CLUSTER_NAME: &str = "rookcluster";

const CEPH_CRYPTO_AES: u16 = 1;
const SECRET_LEN: usize = 16;

pub struct KeyringManager {
    port: u16,
}

impl Default for KeyringManager {
    fn default() -> Self {
        Self::new(DEFAULT_MON_PORT)
    }
}

impl KeyringManager {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl MonitorManager for KeyringManager {
    fn create_cluster_info(&self, name_prefix: &str) -> anyhow::Result<ClusterInfo> {
        let name = if name_prefix.is_empty() {
            DEFAULT_CLUSTER_NAME.to_string()
        } else {
            name_prefix.to_string()
        };
        Ok(ClusterInfo {
            name,
            fsid: Uuid::new_v4().to_string(),
            monitor_secret: generate_secret(),
            admin_secret: generate_secret(),
            monitors: BTreeMap::new(),
        })
    }

    fn to_monitor_config(&self, name: &str, address: &str) -> MonitorConfig {
        MonitorConfig {
            name: name.to_string(),
            address: address.to_string(),
            port: self.port,
        }
    }
}

pub fn generate_secret() -> String {
    let mut key = [0u8; SECRET_LEN];
    rand::rng().fill(&mut key);
    let now = Utc::now();
    encode_secret(&key, now.timestamp(), now.timestamp_subsec_nanos())
}

fn encode_secret(key: &[u8], secs: i64, nsecs: u32) -> String {
    let mut buf = Vec::with_capacity(12 + key.len());
    buf.extend_from_slice(&CEPH_CRYPTO_AES.to_le_bytes());
    buf.extend_from_slice(&(secs as u32).to_le_bytes());
    buf.extend_from_slice(&nsecs.to_le_bytes());
    buf.extend_from_slice(&(key.len() as u16).to_le_bytes());
    buf.extend_from_slice(key);
    STANDARD.encode(buf)
}
