pub mod keyring;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub use keyring::KeyringManager;

/// Generated identity of one storage cluster plus the monitors that serve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterInfo {
    pub name: String,
    pub fsid: String,
    #[serde(skip_serializing)]
    pub monitor_secret: String,
    #[serde(skip_serializing)]
    pub admin_secret: String,
    pub monitors: BTreeMap<String, MonitorConfig>,
}

/// Where a single monitor can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorConfig {
    pub name: String,
    pub address: String,
    pub port: u16,
}

impl MonitorConfig {
    pub fn endpoint(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

/// Owns generation of identity values and the encoding of monitor entries.
pub trait MonitorManager: Send + Sync {
    /// Produce a fresh identity with an empty monitor map.
    fn create_cluster_info(&self, name_prefix: &str) -> anyhow::Result<ClusterInfo>;

    fn to_monitor_config(&self, name: &str, address: &str) -> MonitorConfig;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_formatting() {
        let v4 = MonitorConfig {
            name: "mon0".to_string(),
            address: "10.244.0.3".to_string(),
            port: 6790,
        };
        assert_eq!(v4.endpoint(), "10.244.0.3:6790");

        let v6 = MonitorConfig {
            name: "mon1".to_string(),
            address: "fd00::3".to_string(),
            port: 6790,
        };
        assert_eq!(v6.endpoint(), "[fd00::3]:6790");
    }
}
