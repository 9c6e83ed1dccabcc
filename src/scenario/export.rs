//! Simulator configuration export.
//!
//! A master's configuration is the list of messages it sends, each enriched
//! with the address of the slave it targets. A slave's configuration is its
//! device definition without the editor-only fields (id, name, comment).

use super::ScenarioError;
use crate::ip::Subnet;
use crate::topology::document::GraphSnapshot;
use crate::topology::types::{DeviceIdentity, FunctionCode, Protocol, RegisterBank, Role};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One request as the master process executes it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterMessage {
    pub timestamp: u64,
    pub recurrent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    pub ip: String,
    pub port: u16,
    pub slave_id: u8,
    pub function_code: FunctionCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_address: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterConfig {
    pub ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mac: String,
    pub messages: Vec<MasterMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaveConfig {
    pub ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mac: String,
    pub port: u16,
    pub slave_id: u8,
    pub discrete_inputs: RegisterBank,
    pub coils: RegisterBank,
    pub input_registers: RegisterBank,
    pub holding_registers: RegisterBank,
    pub identity: DeviceIdentity,
}

/// Whole-scenario configuration; masters and slaves keep document order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioConfig {
    pub protocol: Protocol,
    pub ip_network: Subnet,
    pub masters: Vec<MasterConfig>,
    pub slaves: Vec<SlaveConfig>,
}

/// Convert a snapshot into simulator configuration
pub fn build_config(snapshot: &GraphSnapshot) -> Result<ScenarioConfig, ScenarioError> {
    let mut masters: Vec<(&str, MasterConfig)> = Vec::new();
    let mut slaves = Vec::new();

    for node in &snapshot.nodes {
        match (node.role, &node.slave) {
            (Role::Master, _) => masters.push((
                node.id.as_str(),
                MasterConfig { ip: node.ip.clone(), mac: node.mac.clone(), messages: Vec::new() },
            )),
            (Role::Slave, Some(device)) => slaves.push(SlaveConfig {
                ip: node.ip.clone(),
                mac: node.mac.clone(),
                port: device.port,
                slave_id: device.slave_id,
                discrete_inputs: device.registers.discrete_inputs.clone(),
                coils: device.registers.coils.clone(),
                input_registers: device.registers.input_registers.clone(),
                holding_registers: device.registers.holding_registers.clone(),
                identity: device.identity.clone(),
            }),
            (Role::Slave, None) => log::warn!("Slave {} has no device configuration; skipping", node.id),
        }
    }

    let index: HashMap<&str, usize> = masters.iter().enumerate().map(|(i, (id, _))| (*id, i)).collect();

    for edge in &snapshot.edges {
        let target = snapshot
            .node(&edge.target)
            .filter(|n| n.role == Role::Slave)
            .and_then(|n| n.slave.as_ref().map(|device| (n, device)))
            .ok_or_else(|| ScenarioError::UnresolvedTarget { edge: edge.id.clone(), target: edge.target.clone() })?;
        let master = index
            .get(edge.source.as_str())
            .copied()
            .ok_or_else(|| ScenarioError::UnresolvedMaster { edge: edge.id.clone(), master: edge.source.clone() })?;

        let (slave, device) = target;
        masters[master].1.messages.extend(edge.messages.iter().map(|m| MasterMessage {
            timestamp: m.timestamp,
            recurrent: m.recurrent,
            interval: m.interval,
            ip: slave.ip.clone(),
            port: device.port,
            slave_id: device.slave_id,
            function_code: m.function_code,
            start_address: m.start_address,
            count: m.count,
            values: m.values.clone(),
        }));
    }

    Ok(ScenarioConfig {
        protocol: snapshot.protocol,
        ip_network: snapshot.ip_network,
        masters: masters.into_iter().map(|(_, config)| config).collect(),
        slaves,
    })
}

#[derive(Serialize)]
struct Summary<'a> {
    protocol: Protocol,
    ip_network: &'a Subnet,
    masters: usize,
    slaves: usize,
}

/// Write `config` below `dir`
///
/// Layout: `config.yaml`, `masters/{i}/messages.yaml` and
/// `slaves/{i}/slave.yaml`. Previous `masters` and `slaves` trees are
/// replaced.
pub fn write_config(config: &ScenarioConfig, dir: &Path) -> Result<(), ScenarioError> {
    for sub in ["masters", "slaves"] {
        let path = dir.join(sub);
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
    }
    fs::create_dir_all(dir)?;

    let summary = Summary {
        protocol: config.protocol,
        ip_network: &config.ip_network,
        masters: config.masters.len(),
        slaves: config.slaves.len(),
    };
    fs::write(dir.join("config.yaml"), serde_yaml::to_string(&summary)?)?;

    for (i, master) in config.masters.iter().enumerate() {
        let path = dir.join("masters").join(i.to_string());
        fs::create_dir_all(&path)?;
        fs::write(path.join("messages.yaml"), serde_yaml::to_string(master)?)?;
    }
    for (i, slave) in config.slaves.iter().enumerate() {
        let path = dir.join("slaves").join(i.to_string());
        fs::create_dir_all(&path)?;
        fs::write(path.join("slave.yaml"), serde_yaml::to_string(slave)?)?;
    }

    log::info!(
        "Wrote {} master and {} slave configurations to {:?}",
        config.masters.len(),
        config.slaves.len(),
        dir
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::{Edge, Message, Node, SlaveDevice};
    use tempfile::TempDir;

    fn snapshot() -> GraphSnapshot {
        let mut device = SlaveDevice::new(5020, 3);
        device.registers.coils = RegisterBank::Sequential(vec![1, 0]);
        let mut edge = Edge::new("edge1", "plc", "pump");
        let mut read = Message::new(100, FunctionCode::ReadCoils);
        read.start_address = Some(0);
        read.count = Some(2);
        edge.messages = vec![read, Message::new(200, FunctionCode::ReadDeviceIdentification)];

        GraphSnapshot {
            ip_network: "10.0.0.0/24".parse().unwrap(),
            protocol: Protocol::Modbus,
            nodes: vec![
                Node::master("plc", "plc").with_ip("10.0.0.2"),
                Node::slave("pump", "pump", device).with_ip("10.0.0.3"),
            ],
            edges: vec![edge],
        }
    }

    #[test]
    fn test_messages_carry_target_address() {
        let config = build_config(&snapshot()).unwrap();
        assert_eq!(config.masters.len(), 1);
        let messages = &config.masters[0].messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].ip, "10.0.0.3");
        assert_eq!(messages[0].port, 5020);
        assert_eq!(messages[0].slave_id, 3);
        assert_eq!(messages[1].function_code, FunctionCode::ReadDeviceIdentification);
        assert_eq!(config.slaves[0].coils, RegisterBank::Sequential(vec![1, 0]));
    }

    #[test]
    fn test_unresolved_target() {
        let mut graph = snapshot();
        graph.edges[0].target = "ghost".into();
        assert!(matches!(build_config(&graph), Err(ScenarioError::UnresolvedTarget { .. })));
    }

    #[test]
    fn test_unresolved_master() {
        let mut graph = snapshot();
        graph.edges[0].source = "ghost".into();
        let err = build_config(&graph).unwrap_err();
        assert!(matches!(&err, ScenarioError::UnresolvedMaster { master, .. } if master == "ghost"));
        assert_eq!(err.to_string(), "Edge edge1 starts at ghost, which is not a master");
    }

    #[test]
    fn test_write_layout() {
        let dir = TempDir::new().unwrap();
        let config = build_config(&snapshot()).unwrap();
        write_config(&config, dir.path()).unwrap();

        let master = fs::read_to_string(dir.path().join("masters/0/messages.yaml")).unwrap();
        assert!(master.contains("slave_id: 3"));
        assert!(master.contains("function_code: 43"));

        let slave = fs::read_to_string(dir.path().join("slaves/0/slave.yaml")).unwrap();
        assert!(slave.contains("port: 5020"));
        assert!(!slave.contains("pump"));

        let summary = fs::read_to_string(dir.path().join("config.yaml")).unwrap();
        assert!(summary.contains("10.0.0.0/24"));
        assert!(summary.contains("masters: 1"));
    }
}
