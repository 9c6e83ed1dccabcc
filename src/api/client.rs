//! Blocking HTTP client for the scenario server.

use super::types::{ApiMessage, CreateNetworkRequest, ErrorBody, RunRequest, RunStarted, RunStatus};
use super::{ApiError, SimulationApi};
use crate::config::ServerConfig;
use crate::topology::document::NetworkDocument;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the scenario server's JSON API
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ApiError> {
        Self::new(config.url.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a JSON body into `T`
    ///
    /// Non-2xx statuses and 2xx bodies carrying an `error` field both become
    /// [`ApiError::Server`] with the server's message.
    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        log::debug!("Server answered {} with {} bytes", status.as_u16(), body.len());

        if let Ok(error) = serde_json::from_str::<ErrorBody>(&body) {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: error.error.describe(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl SimulationApi for HttpApiClient {
    fn list_scenarios(&self) -> Result<Vec<String>, ApiError> {
        self.send(self.client.get(self.url("/api/network/")))
    }

    fn create_network(&self, request: &CreateNetworkRequest) -> Result<String, ApiError> {
        log::info!("Creating network {} on {}", request.project_name, request.ip_subrange);
        let reply: ApiMessage = self.send(self.client.post(self.url("/api/network/")).json(request))?;
        Ok(reply.message.unwrap_or_default())
    }

    fn load_network(&self, name: &str) -> Result<NetworkDocument, ApiError> {
        log::info!("Loading network {}", name);
        self.send(self.client.get(self.url(&format!("/api/network/{}", name))))
    }

    fn save_network(&self, name: &str, document: &NetworkDocument) -> Result<String, ApiError> {
        log::info!("Saving network {}", name);
        let reply: ApiMessage = self.send(
            self.client
                .put(self.url(&format!("/api/network/{}", name)))
                .json(document),
        )?;
        Ok(reply.message.unwrap_or_default())
    }

    fn start_run(&self, name: &str, request: &RunRequest) -> Result<RunStarted, ApiError> {
        log::info!("Starting run of {} for {}s", name, request.simulation_time);
        self.send(self.client.post(self.url(&format!("/api/run/{}", name))).json(request))
    }

    fn run_status(&self) -> Result<RunStatus, ApiError> {
        self.send(self.client.get(self.url("/api/run/")))
    }

    fn stop_run(&self) -> Result<(), ApiError> {
        log::info!("Stopping run");
        let _: ApiMessage = self.send(self.client.delete(self.url("/api/run/")))?;
        Ok(())
    }
}
