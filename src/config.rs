use crate::topology::types::{NodeDefaults, Protocol};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration structure that mirrors the YAML configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Scenario server connection
    pub server: ServerConfig,
    /// Simulation run settings
    pub run: RunConfig,
    /// Values given to newly placed devices
    pub defaults: DefaultsConfig,
    /// (Optional) Log filter, e.g. "debug" or "icsnet=trace"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the scenario server
    pub url: String,
    /// Per-request timeout (e.g., "30s", "2m")
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Delay between status polls of a running simulation
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub port: u16,
    pub slave_id: u8,
    pub protocol: Protocol,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let node = NodeDefaults::default();
        Self {
            port: node.port,
            slave_id: node.slave_id,
            protocol: Protocol::default(),
        }
    }
}

impl DefaultsConfig {
    pub fn node_defaults(&self) -> NodeDefaults {
        NodeDefaults {
            port: self.port,
            slave_id: self.slave_id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),
    #[error("Invalid run configuration: {0}")]
    InvalidRun(String),
}

impl EditorConfig {
    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.server.url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidServer("url must not be empty".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidServer(format!(
                "url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.server.timeout.is_zero() {
            return Err(ConfigError::InvalidServer("timeout must be greater than 0".to_string()));
        }
        if self.run.poll_interval.is_zero() {
            return Err(ConfigError::InvalidRun("poll_interval must be greater than 0".to_string()));
        }
        Ok(())
    }
}
