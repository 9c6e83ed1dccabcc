//! Editing session orchestrator.
//!
//! This module coordinates the workflows that cross the core's boundary:
//! loading a scenario into an editing session, the validate-then-save
//! policy, starter network creation and simulator export.

use crate::api::types::CreateNetworkRequest;
use crate::api::SimulationApi;
use crate::config::EditorConfig;
use crate::ip::Subnet;
use crate::scenario::{build_config, generate_network, write_config};
use crate::topology::document::{GraphSnapshot, NetworkDocument};
use crate::topology::model::GraphModel;
use crate::validation::{save_decision, validate, Diagnostic, SaveDecision};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Result of a save attempt that reached a decision
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Stored; carries the server's message
    Saved(String),
    /// Validation errors; nothing was sent
    Refused(Vec<Diagnostic>),
    /// Warnings were shown and the operator declined
    Declined(Vec<Diagnostic>),
}

/// Validate a snapshot and store it under `name` if the save policy allows
///
/// `confirm` is asked only when the findings are all warnings.
pub fn save_scenario<F>(api: &dyn SimulationApi, name: &str, snapshot: &GraphSnapshot, confirm: F) -> Result<SaveOutcome>
where
    F: FnOnce(&[Diagnostic]) -> bool,
{
    match save_decision(validate(snapshot)) {
        SaveDecision::Refuse(errors) => {
            for error in &errors {
                warn!("{}", error);
            }
            return Ok(SaveOutcome::Refused(errors));
        }
        SaveDecision::Confirm(warnings) => {
            if !confirm(&warnings) {
                info!("Save of {} declined after {} warnings", name, warnings.len());
                return Ok(SaveOutcome::Declined(warnings));
            }
        }
        SaveDecision::Proceed => {}
    }

    let message = api
        .save_network(name, &snapshot.to_document())
        .wrap_err_with(|| format!("Failed to save scenario '{}'", name))?;
    info!("Saved scenario {}", name);
    Ok(SaveOutcome::Saved(message))
}

/// Open a stored scenario for editing
pub fn open_scenario(api: &dyn SimulationApi, name: &str, config: &EditorConfig) -> Result<GraphModel> {
    let document = api
        .load_network(name)
        .wrap_err_with(|| format!("Failed to load scenario '{}'", name))?;
    Ok(GraphModel::from_snapshot(document.into_snapshot()).with_defaults(config.defaults.node_defaults()))
}

/// Ask the server to generate and store a starter network
pub fn create_scenario(
    api: &dyn SimulationApi,
    name: &str,
    subnet: Subnet,
    masters: u32,
    slaves: u32,
    config: &EditorConfig,
) -> Result<String> {
    let request = CreateNetworkRequest {
        project_name: name.to_string(),
        ip_subrange: subnet,
        protocol: config.defaults.protocol,
        master_nodes: masters,
        slave_nodes: slaves,
    };
    api.create_network(&request)
        .wrap_err_with(|| format!("Failed to create scenario '{}'", name))
}

/// Generate a starter network document locally
pub fn create_document(subnet: Subnet, masters: u32, slaves: u32, config: &EditorConfig) -> Result<NetworkDocument> {
    let snapshot = generate_network(
        config.defaults.protocol,
        subnet,
        masters,
        slaves,
        &config.defaults.node_defaults(),
    )?;
    Ok(snapshot.to_document())
}

pub fn read_document(path: &Path) -> Result<NetworkDocument> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read network document '{}'", path.display()))?;
    NetworkDocument::from_json(&content)
        .wrap_err_with(|| format!("Failed to parse network document '{}'", path.display()))
}

pub fn write_document(path: &Path, document: &NetworkDocument) -> Result<()> {
    let json = document.to_json_pretty()?;
    fs::write(path, json).wrap_err_with(|| format!("Failed to write network document '{}'", path.display()))
}

/// Export a document into simulator configuration under `output_dir`
///
/// Documents with validation errors are not exported.
pub fn export_document(document: NetworkDocument, output_dir: &Path) -> Result<()> {
    let snapshot = document.into_snapshot();
    let errors: Vec<Diagnostic> = validate(&snapshot).into_iter().filter(Diagnostic::is_error).collect();
    if !errors.is_empty() {
        let report = errors.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("\n");
        return Err(eyre!("Network has {} validation errors:\n{}", errors.len(), report));
    }

    let config = build_config(&snapshot)?;
    write_config(&config, output_dir)
        .wrap_err_with(|| format!("Failed to write scenario to '{}'", output_dir.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{RunRequest, RunStarted, RunStatus};
    use crate::api::ApiError;
    use crate::topology::types::{Edge, Message, FunctionCode, Node, Protocol, RegisterBank, SlaveDevice};
    use std::cell::RefCell;
    use tempfile::{NamedTempFile, TempDir};

    #[derive(Default)]
    struct StoreApi {
        saved: RefCell<Vec<(String, NetworkDocument)>>,
    }

    impl SimulationApi for StoreApi {
        fn list_scenarios(&self) -> Result<Vec<String>, ApiError> {
            Ok(self.saved.borrow().iter().map(|(name, _)| name.clone()).collect())
        }

        fn create_network(&self, request: &CreateNetworkRequest) -> Result<String, ApiError> {
            Ok(format!("Network created and saved as {}", request.project_name))
        }

        fn load_network(&self, name: &str) -> Result<NetworkDocument, ApiError> {
            self.saved
                .borrow()
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, d)| d.clone())
                .ok_or_else(|| ApiError::Server { status: 404, message: format!("{} not found", name) })
        }

        fn save_network(&self, name: &str, document: &NetworkDocument) -> Result<String, ApiError> {
            self.saved.borrow_mut().push((name.to_string(), document.clone()));
            Ok(format!("Scenario saved as {}", name))
        }

        fn start_run(&self, _: &str, _: &RunRequest) -> Result<RunStarted, ApiError> {
            Err(ApiError::Transport("offline".into()))
        }

        fn run_status(&self) -> Result<RunStatus, ApiError> {
            Err(ApiError::Transport("offline".into()))
        }

        fn stop_run(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn valid_snapshot() -> GraphSnapshot {
        let mut device = SlaveDevice::new(502, 1);
        device.registers.holding_registers = RegisterBank::Sequential(vec![7]);
        let mut edge = Edge::new("edge1", "m", "s");
        let mut message = Message::new(0, FunctionCode::ReadHoldingRegisters);
        message.count = Some(1);
        edge.messages.push(message);
        GraphSnapshot {
            ip_network: "10.0.0.0/24".parse().unwrap(),
            protocol: Protocol::Modbus,
            nodes: vec![Node::master("m", "m").with_ip("10.0.0.2"), Node::slave("s", "s", device).with_ip("10.0.0.3")],
            edges: vec![edge],
        }
    }

    #[test]
    fn test_clean_network_saves_without_confirmation() {
        let api = StoreApi::default();
        let outcome = save_scenario(&api, "plant", &valid_snapshot(), |_| panic!("no confirmation expected")).unwrap();
        assert_eq!(outcome, SaveOutcome::Saved("Scenario saved as plant".into()));

        let model = open_scenario(&api, "plant", &EditorConfig::default()).unwrap();
        assert_eq!(model.snapshot(), valid_snapshot());
    }

    #[test]
    fn test_errors_refuse_save() {
        let api = StoreApi::default();
        let mut snapshot = valid_snapshot();
        snapshot.nodes[1].ip = "10.0.0.2".into();
        let outcome = save_scenario(&api, "plant", &snapshot, |_| true).unwrap();
        assert!(matches!(outcome, SaveOutcome::Refused(ref errors) if errors.len() == 1));
        assert!(api.saved.borrow().is_empty());
    }

    #[test]
    fn test_warnings_need_confirmation() {
        let api = StoreApi::default();
        let mut snapshot = valid_snapshot();
        snapshot.edges[0].messages.clear();

        let outcome = save_scenario(&api, "plant", &snapshot, |warnings| {
            assert_eq!(warnings.len(), 1);
            false
        })
        .unwrap();
        assert!(matches!(outcome, SaveOutcome::Declined(_)));
        assert!(api.saved.borrow().is_empty());

        let outcome = save_scenario(&api, "plant", &snapshot, |_| true).unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved(_)));
    }

    #[test]
    fn test_document_file_round_trip_and_export() {
        let document = create_document("10.1.0.0/24".parse().unwrap(), 1, 2, &EditorConfig::default()).unwrap();
        let file = NamedTempFile::new().unwrap();
        write_document(file.path(), &document).unwrap();
        assert_eq!(read_document(file.path()).unwrap(), document);

        let dir = TempDir::new().unwrap();
        export_document(valid_snapshot().to_document(), dir.path()).unwrap();
        assert!(dir.path().join("masters/0/messages.yaml").exists());
        assert!(dir.path().join("slaves/0/slave.yaml").exists());
    }

    #[test]
    fn test_export_refuses_invalid_document() {
        let mut snapshot = valid_snapshot();
        snapshot.nodes[0].ip.clear();
        let dir = TempDir::new().unwrap();
        assert!(export_document(snapshot.to_document(), dir.path()).is_err());
    }
}
