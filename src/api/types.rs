//! Request and response bodies of the scenario server.

use crate::ip::Subnet;
use crate::topology::types::Protocol;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/network/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNetworkRequest {
    pub project_name: String,
    pub ip_subrange: Subnet,
    pub protocol: Protocol,
    pub master_nodes: u32,
    pub slave_nodes: u32,
}

/// Body of `POST /api/run/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Whole seconds
    #[serde(alias = "simulation_time")]
    pub simulation_time: u64,
}

/// Success body of `POST /api/run/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStarted {
    /// Capture file the simulation writes to
    #[serde(alias = "filePath")]
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `GET /api/run/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    #[serde(alias = "elapsed_seconds")]
    pub elapsed_seconds: u64,
    #[serde(alias = "total_seconds")]
    pub total_seconds: u64,
    /// Capture size in bytes
    #[serde(default, alias = "pcap_size", alias = "outputSize")]
    pub pcap_size: u64,
    pub running: bool,
}

impl RunStatus {
    /// True once the run has no more time to go or the server reports it idle
    pub fn is_finished(&self) -> bool {
        self.elapsed_seconds >= self.total_seconds || !self.running
    }
}

/// Informational success body, e.g. `{"message": "Scenario saved as x"}`
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

/// Error body; the server reports either one string or a list of findings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Text(String),
    List(Vec<serde_json::Value>),
    Other(serde_json::Value),
}

impl ErrorDetail {
    pub fn describe(&self) -> String {
        fn item(value: &serde_json::Value) -> String {
            match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }
        }

        match self {
            ErrorDetail::Text(text) => text.clone(),
            ErrorDetail::List(items) => items.iter().map(item).collect::<Vec<_>>().join("\n"),
            ErrorDetail::Other(value) => item(value),
        }
    }
}
