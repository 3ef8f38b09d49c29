//! Runtime configuration.
//!
//! Loaded from a JSON file (`config/tool_config.json` by default). Every field
//! has a default, so a partial file or no file at all is valid.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config/tool_config.json";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Subnets scanned when none are given on the command line.
    pub subnets: Vec<String>,
    pub discovery: DiscoveryConfig,
    pub probe: ProbeConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub nmap_path: PathBuf,
    /// Arguments passed to nmap before the subnet.
    pub arguments: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub ping_path: PathBuf,
    /// Echo requests sent per host.
    pub count: u32,
    /// Seconds ping waits for each reply.
    pub wait_secs: u32,
    /// Hard limit on a single ping invocation.
    pub timeout_secs: u64,
    /// Maximum number of probes in flight at once.
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Disables both the relational and the document store.
    pub enabled: bool,
    pub sqlite_path: PathBuf,
    pub documents_dir: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            nmap_path: PathBuf::from("nmap"),
            arguments: ["-PR", "-sn", "--max-retries", "0"]
                .iter()
                .map(|arg| arg.to_string())
                .collect(),
            timeout_secs: 120,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_path: PathBuf::from("ping"),
            count: 5,
            wait_secs: 1,
            timeout_secs: 15,
            concurrency: 32,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sqlite_path: PathBuf::from("netmind_local_db.db"),
            documents_dir: PathBuf::from("netmind_documents"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given (it must exist), otherwise the default path if it
    /// exists, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(bool, &str); 5] = [
            (self.probe.concurrency == 0, "probe.concurrency must be at least 1"),
            (self.probe.count == 0, "probe.count must be at least 1"),
            (self.probe.timeout_secs == 0, "probe.timeout_secs must be at least 1"),
            (self.discovery.timeout_secs == 0, "discovery.timeout_secs must be at least 1"),
            (self.cache.ttl_secs == 0, "cache.ttl_secs must be at least 1"),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, reason)) => Err(ConfigError::Invalid(reason.to_string())),
            None => Ok(()),
        }
    }
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
