//! Scenario server interface.
//!
//! The editor core only defines the shapes exchanged with the server and the
//! operations it needs. [`SimulationApi`] is the seam: the run controller and
//! the save workflow are written against it, [`client::HttpApiClient`] talks
//! HTTP, and tests substitute in-memory fakes.

pub mod client;
pub mod types;

pub use client::HttpApiClient;
pub use types::{CreateNetworkRequest, RunRequest, RunStarted, RunStatus};

use crate::topology::document::NetworkDocument;

/// Failures of a single server round trip
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Operations offered by the scenario server
///
/// Every call is one blocking round trip; nothing is retried.
pub trait SimulationApi {
    /// Names of the stored scenarios
    fn list_scenarios(&self) -> Result<Vec<String>, ApiError>;

    /// Generate and store a starter network; returns the server's message
    fn create_network(&self, request: &CreateNetworkRequest) -> Result<String, ApiError>;

    fn load_network(&self, name: &str) -> Result<NetworkDocument, ApiError>;

    /// Store a document under `name`; the server re-validates it
    fn save_network(&self, name: &str, document: &NetworkDocument) -> Result<String, ApiError>;

    fn start_run(&self, name: &str, request: &RunRequest) -> Result<RunStarted, ApiError>;

    fn run_status(&self) -> Result<RunStatus, ApiError>;

    fn stop_run(&self) -> Result<(), ApiError>;
}
