//! Scenario generation and export.
//!
//! This module builds starter networks and converts an edited network into
//! the per-device configuration files the simulator consumes.

pub mod export;
pub mod generator;

pub use export::{build_config, write_config, MasterConfig, MasterMessage, ScenarioConfig, SlaveConfig};
pub use generator::generate_network;

use crate::ip::IpError;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("A starter network needs at least one master and one slave")]
    EmptyNetwork,
    #[error(transparent)]
    Ip(#[from] IpError),
    #[error("Edge {edge} targets {target}, which is not a configured slave")]
    UnresolvedTarget { edge: String, target: String },
    #[error("Edge {edge} starts at {master}, which is not a master")]
    UnresolvedMaster { edge: String, master: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
