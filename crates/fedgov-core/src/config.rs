//! Configuration system for fedgov.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $FEDGOV_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/fedgov/config.toml
//!   3. ~/.config/fedgov/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::DEFAULT_LEASE_SECS;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FedgovConfig {
    pub node: NodeConfig,
    pub network: NetworkConfig,
    pub lease: LeaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Number of local devices offered for lease.
    pub device_count: u32,
    /// Base URL peers should use to reach us. Empty = http://127.0.0.1:<api_port>.
    pub advertise_host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// HTTP port for both the peer protocol and the operator API.
    pub api_port: u16,
    /// Base URLs of peers to join at startup, e.g. "http://10.0.0.4:5000".
    pub seed_peers: Vec<String>,
    /// Seconds between gossip rounds. 0 = no periodic gossip.
    pub gossip_interval_secs: u64,
    /// Neighbors contacted per gossip round.
    pub gossip_fanout: usize,
    /// Timeout for outbound peer requests.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaseConfig {
    /// Lease applied to probes that do not name one.
    pub default_lease_secs: u64,
    /// Longest lease a caller may request.
    pub max_lease_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_count: 1,
            advertise_host: String::new(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            api_port: 5000,
            seed_peers: Vec::new(),
            gossip_interval_secs: 30,
            gossip_fanout: 3,
            request_timeout_secs: 10,
        }
    }
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            default_lease_secs: DEFAULT_LEASE_SECS,
            max_lease_secs: 86_400,
        }
    }
}

impl NodeConfig {
    /// The advertised host, falling back to loopback on the API port.
    pub fn advertise_host(&self, api_port: u16) -> String {
        if self.advertise_host.is_empty() {
            format!("http://127.0.0.1:{}", api_port)
        } else {
            self.advertise_host.trim_end_matches('/').to_string()
        }
    }
}

impl LeaseConfig {
    pub fn default_lease(&self) -> Duration {
        Duration::from_secs(self.default_lease_secs)
    }

    pub fn max_lease(&self) -> Duration {
        Duration::from_secs(self.max_lease_secs)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("fedgov")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl FedgovConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            FedgovConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("FEDGOV_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&FedgovConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply FEDGOV_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(n) = var("FEDGOV_NODE__DEVICE_COUNT").and_then(|v| v.parse().ok()) {
            self.node.device_count = n;
        }
        if let Some(v) = var("FEDGOV_NODE__ADVERTISE_HOST") {
            self.node.advertise_host = v;
        }
        if let Some(v) = var("FEDGOV_NETWORK__BIND_ADDR") {
            self.network.bind_addr = v;
        }
        // PORT is the legacy spelling; the namespaced one wins.
        if let Some(p) = var("PORT").and_then(|v| v.parse().ok()) {
            self.network.api_port = p;
        }
        if let Some(p) = var("FEDGOV_NETWORK__API_PORT").and_then(|v| v.parse().ok()) {
            self.network.api_port = p;
        }
        if let Some(v) = var("FEDGOV_NETWORK__SEED_PEERS") {
            self.network.seed_peers = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(s) = var("FEDGOV_NETWORK__GOSSIP_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.network.gossip_interval_secs = s;
        }
        if let Some(s) = var("FEDGOV_LEASE__DEFAULT_LEASE_SECS").and_then(|v| v.parse().ok()) {
            self.lease.default_lease_secs = s;
        }
        if let Some(s) = var("FEDGOV_LEASE__MAX_LEASE_SECS").and_then(|v| v.parse().ok()) {
            self.lease.max_lease_secs = s;
        }
    }
}
