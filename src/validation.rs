//! Pre-save topology validation.
//!
//! This module runs every structural and semantic rule over a graph snapshot
//! and classifies the findings into errors, which block saving, and
//! warnings, which need confirmation.

use crate::topology::document::GraphSnapshot;
use crate::topology::types::Role;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::net::Ipv4Addr;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Warning => write!(f, "WARNING"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// One validation finding
///
/// `context` lists the ids or names of the elements involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub context: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, context: Vec<String>) -> Self {
        Self { level: Level::Error, message: message.into(), context }
    }

    pub fn warning(message: impl Into<String>, context: Vec<String>) -> Self {
        Self { level: Level::Warning, message: message.into(), context }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// What the save workflow should do with a set of findings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDecision {
    /// Nothing found
    Proceed,
    /// Only warnings; the operator must confirm
    Confirm(Vec<Diagnostic>),
    /// At least one error; every error is reported and nothing is saved
    Refuse(Vec<Diagnostic>),
}

/// Validate a snapshot against every rule
///
/// All rules run, so one pass reports every finding.
///
/// # Arguments
/// * `snapshot` - The graph to check
///
/// # Returns
/// * Every diagnostic found, errors and warnings mixed in rule order
pub fn validate(snapshot: &GraphSnapshot) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    diagnostics.extend(check_duplicate_ids(snapshot));
    diagnostics.extend(check_edges(snapshot));
    diagnostics.extend(check_ip_addresses(snapshot));
    diagnostics.extend(check_register_keys(snapshot));
    diagnostics.extend(check_empty_slaves(snapshot));
    diagnostics.extend(check_empty_schedules(snapshot));
    diagnostics.extend(check_isolated_nodes(snapshot));

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    log::info!(
        "Validation found {} errors and {} warnings",
        errors,
        diagnostics.len() - errors
    );
    diagnostics
}

/// Turn findings into the save policy
pub fn save_decision(diagnostics: Vec<Diagnostic>) -> SaveDecision {
    let (errors, warnings): (Vec<_>, Vec<_>) = diagnostics.into_iter().partition(Diagnostic::is_error);
    if !errors.is_empty() {
        SaveDecision::Refuse(errors)
    } else if !warnings.is_empty() {
        SaveDecision::Confirm(warnings)
    } else {
        SaveDecision::Proceed
    }
}

fn check_duplicate_ids(snapshot: &GraphSnapshot) -> Vec<Diagnostic> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in &snapshot.nodes {
        *counts.entry(node.id.as_str()).or_default() += 1;
    }

    let duplicated: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id.to_string())
        .collect();

    if duplicated.is_empty() {
        return Vec::new();
    }
    vec![Diagnostic::error(
        format!("Duplicate node ids: {}", duplicated.join(", ")),
        duplicated,
    )]
}

fn check_edges(snapshot: &GraphSnapshot) -> Vec<Diagnostic> {
    let roles: HashMap<&str, Role> = snapshot.nodes.iter().map(|n| (n.id.as_str(), n.role)).collect();
    let mut diagnostics = Vec::new();

    for edge in &snapshot.edges {
        let missing: Vec<&str> = [edge.source.as_str(), edge.target.as_str()]
            .into_iter()
            .filter(|id| !roles.contains_key(id))
            .collect();
        if !missing.is_empty() {
            diagnostics.push(Diagnostic::error(
                format!("Edge {} references unknown node {}", edge.id, missing.join(", ")),
                vec![edge.id.clone()],
            ));
            continue;
        }

        if roles[edge.source.as_str()] == roles[edge.target.as_str()] {
            diagnostics.push(Diagnostic::error(
                format!(
                    "Edge {} connects two {} nodes ({} and {})",
                    edge.id,
                    roles[edge.source.as_str()],
                    edge.source,
                    edge.target
                ),
                vec![edge.id.clone()],
            ));
        }
    }

    diagnostics
}

fn check_ip_addresses(snapshot: &GraphSnapshot) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut by_ip: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for node in &snapshot.nodes {
        let ip = node.ip.trim();
        if ip.is_empty() {
            diagnostics.push(Diagnostic::error(
                format!("Node {} has no IP address", node.name),
                vec![node.id.clone()],
            ));
            continue;
        }

        match ip.parse::<Ipv4Addr>() {
            Ok(address) if !snapshot.ip_network.contains(address) => {
                diagnostics.push(Diagnostic::error(
                    format!("IP {} of node {} is outside network {}", ip, node.name, snapshot.ip_network),
                    vec![node.id.clone()],
                ));
            }
            Ok(_) => {}
            Err(_) => {
                diagnostics.push(Diagnostic::error(
                    format!("Node {} has an invalid IP address '{}'", node.name, ip),
                    vec![node.id.clone()],
                ));
            }
        }

        by_ip.entry(ip).or_default().push(node.name.clone());
    }

    for (ip, names) in by_ip {
        if names.len() > 1 {
            diagnostics.push(Diagnostic::error(
                format!("IP {} is used by nodes: {}", ip, names.join(", ")),
                names,
            ));
        }
    }

    diagnostics
}

fn check_register_keys(snapshot: &GraphSnapshot) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for node in &snapshot.nodes {
        let Some(banks) = node.registers() else { continue };
        for (name, bank) in banks.iter() {
            if !bank.invalid_keys().is_empty() {
                diagnostics.push(Diagnostic::error(
                    format!("Node {} has sparse {} addresses below 1", node.name, name),
                    vec![node.id.clone()],
                ));
            }
        }
    }
    diagnostics
}

fn check_empty_slaves(snapshot: &GraphSnapshot) -> Vec<Diagnostic> {
    snapshot
        .nodes
        .iter()
        .filter(|n| n.role == Role::Slave)
        .filter(|n| n.registers().map_or(true, |banks| banks.all_empty()))
        .map(|n| Diagnostic::warning(format!("Slave {} has no register values", n.name), vec![n.id.clone()]))
        .collect()
}

fn check_empty_schedules(snapshot: &GraphSnapshot) -> Vec<Diagnostic> {
    snapshot
        .edges
        .iter()
        .filter(|e| e.messages.is_empty())
        .map(|e| Diagnostic::warning(format!("Edge {} has no messages", e.id), vec![e.id.clone()]))
        .collect()
}

fn check_isolated_nodes(snapshot: &GraphSnapshot) -> Vec<Diagnostic> {
    let connected: HashSet<&str> = snapshot
        .edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();

    snapshot
        .nodes
        .iter()
        .filter(|n| !connected.contains(n.id.as_str()))
        .map(|n| Diagnostic::warning(format!("Node {} has no connections", n.name), vec![n.id.clone()]))
        .collect()
}
