use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

pub const DEFAULT_NAMESPACE: &str = "rook";
pub const DEFAULT_MON_SIZE: usize = 3;
pub const DEFAULT_MON_PORT: u16 = 6790;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 6;
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 15;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    // image tag of the rookd monitor container
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub cluster_name_prefix: String,
    #[serde(default)]
    pub mon: MonConfig,
    // Xline endpoints
    pub xline_config: XlineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonConfig {
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub poll: PollSettings,
}

impl Default for MonConfig {
    fn default() -> Self {
        MonConfig {
            size: DEFAULT_MON_SIZE,
            port: DEFAULT_MON_PORT,
            poll: PollSettings::default(),
        }
    }
}

/// Raw poll settings as written in the YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct PollSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

/// How the readiness poller waits for a monitor pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollSettings::default().into()
    }
}

impl From<PollSettings> for PollConfig {
    fn from(s: PollSettings) -> Self {
        PollConfig {
            interval: Duration::from_secs(s.interval_secs),
            max_attempts: s.max_attempts,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct XlineConfig {
    pub endpoints: Vec<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_version() -> String {
    "latest".to_string()
}

fn default_prefix() -> String {
    "/registry".to_string()
}

fn default_size() -> usize {
    DEFAULT_MON_SIZE
}

fn default_port() -> u16 {
    DEFAULT_MON_PORT
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_POLL_MAX_ATTEMPTS
}

pub fn load_config(path: &str) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config from {path}"))?;
    let cfg: Config = serde_yaml::from_str(&content).context("Failed to parse YAML config")?;
    check_config(&cfg)?;
    Ok(cfg)
}

fn check_config(cfg: &Config) -> Result<()> {
    if cfg.mon.size == 0 {
        bail!("mon.size must be at least 1");
    }
    if cfg.mon.poll.max_attempts == 0 {
        bail!("mon.poll.max_attempts must be at least 1");
    }
    if cfg.xline_config.endpoints.is_empty() {
        bail!("xline_config.endpoints must not be empty");
    }
    Ok(())
}
