//! Cluster configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::tags::Tags;

pub const DEFAULT_BASE_URL: &str = "https://management.azure.com";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Virtual network the cluster lives in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VnetConfig {
    pub name: String,
    /// Defaults to the cluster resource group when empty.
    #[serde(default)]
    pub resource_group: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub tags: Tags,
}

/// Declared cluster configuration, loaded from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub cluster_name: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub location: String,
    pub vnet: VnetConfig,
    /// Extra tags stamped on every created resource.
    #[serde(default)]
    pub additional_tags: Tags,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl ClusterConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ClusterConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster_name.is_empty() {
            return Err(ConfigError::MissingField("cluster_name"));
        }
        if self.subscription_id.is_empty() {
            return Err(ConfigError::MissingField("subscription_id"));
        }
        if self.resource_group.is_empty() {
            return Err(ConfigError::MissingField("resource_group"));
        }
        if self.vnet.name.is_empty() {
            return Err(ConfigError::MissingField("vnet.name"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
