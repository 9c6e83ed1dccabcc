//! Topology type definitions.
//!
//! Devices (nodes), communication links (edges), register banks and the
//! scheduled protocol messages carried by each link.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::collections::BTreeMap;
use std::fmt;

pub type NodeId = String;
pub type EdgeId = String;

/// Device role on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Polling controller
    Master,
    /// Responding field device
    Slave,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Slave => write!(f, "slave"),
        }
    }
}

/// Industrial protocol spoken on the simulated network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Modbus,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Modbus => write!(f, "modbus"),
        }
    }
}

/// Storage layout of a register bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterKind {
    #[default]
    Sequential,
    Sparse,
}

/// One of the four addressable value tables of a slave
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum RegisterBank {
    /// Values at consecutive addresses starting at the first one
    Sequential(Vec<u16>),
    /// Address to value mapping; addresses start at 1
    #[serde(with = "sparse_addresses")]
    Sparse(BTreeMap<u16, u16>),
}

/// Sparse banks are keyed by address strings on the wire.
mod sparse_addresses {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(values: &BTreeMap<u16, u16>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(values.iter().map(|(address, value)| (address.to_string(), value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<u16, u16>, D::Error> {
        let raw = BTreeMap::<String, u16>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(address, value)| {
                address
                    .trim()
                    .parse::<u16>()
                    .map(|address| (address, value))
                    .map_err(|_| D::Error::custom(format!("invalid register address '{}'", address)))
            })
            .collect()
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        RegisterBank::Sequential(Vec::new())
    }
}

impl RegisterBank {
    pub fn empty(kind: RegisterKind) -> Self {
        match kind {
            RegisterKind::Sequential => RegisterBank::Sequential(Vec::new()),
            RegisterKind::Sparse => RegisterBank::Sparse(BTreeMap::new()),
        }
    }

    pub fn kind(&self) -> RegisterKind {
        match self {
            RegisterBank::Sequential(_) => RegisterKind::Sequential,
            RegisterBank::Sparse(_) => RegisterKind::Sparse,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RegisterBank::Sequential(values) => values.len(),
            RegisterBank::Sparse(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sparse addresses that violate the `address >= 1` rule
    pub fn invalid_keys(&self) -> Vec<u16> {
        match self {
            RegisterBank::Sequential(_) => Vec::new(),
            RegisterBank::Sparse(values) => values.keys().copied().filter(|k| *k < 1).collect(),
        }
    }
}

/// The four register banks of a slave device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBanks {
    #[serde(default, alias = "discrete_inputs")]
    pub discrete_inputs: RegisterBank,
    #[serde(default)]
    pub coils: RegisterBank,
    #[serde(default, alias = "input_registers")]
    pub input_registers: RegisterBank,
    #[serde(default, alias = "holding_registers")]
    pub holding_registers: RegisterBank,
}

impl RegisterBanks {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &RegisterBank)> {
        [
            ("discreteInputs", &self.discrete_inputs),
            ("coils", &self.coils),
            ("inputRegisters", &self.input_registers),
            ("holdingRegisters", &self.holding_registers),
        ]
        .into_iter()
    }

    /// True when none of the banks holds a value
    pub fn all_empty(&self) -> bool {
        self.iter().all(|(_, bank)| bank.is_empty())
    }
}

/// Device identification strings answered to function code 43
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceIdentity {
    #[serde(alias = "vendor_name")]
    pub vendor_name: String,
    #[serde(alias = "product_code")]
    pub product_code: String,
    #[serde(alias = "major_minor_revision")]
    pub major_minor_revision: String,
    #[serde(alias = "vendor_url")]
    pub vendor_url: String,
    #[serde(alias = "product_name")]
    pub product_name: String,
    #[serde(alias = "model_name")]
    pub model_name: String,
    #[serde(alias = "user_application_name")]
    pub user_application_name: String,
}

/// Slave-only device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaveDevice {
    pub port: u16,
    #[serde(alias = "slave_id")]
    pub slave_id: u8,
    #[serde(flatten)]
    pub registers: RegisterBanks,
    #[serde(default)]
    pub identity: DeviceIdentity,
}

impl SlaveDevice {
    pub fn new(port: u16, slave_id: u8) -> Self {
        Self {
            port,
            slave_id,
            registers: RegisterBanks::default(),
            identity: DeviceIdentity::default(),
        }
    }
}

/// A device placed on the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawNode")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub mac: String,
    /// Present exactly when `role` is slave
    #[serde(flatten)]
    pub slave: Option<SlaveDevice>,
}

/// A persisted node whose shape disagrees with its role
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeShapeError {
    #[error("Slave node '{0}' has no port")]
    MissingPort(String),
    #[error("Slave node '{0}' has no slave id")]
    MissingSlaveId(String),
    #[error("Node '{id}' has an invalid {field} '{value}'")]
    InvalidNumber { id: String, field: &'static str, value: String },
    #[error("Master node '{0}' carries slave configuration")]
    MasterWithSlaveConfig(String),
}

/// Port and slave id arrive as numbers or as numeric strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumberField {
    Number(u64),
    Text(String),
}

impl NumberField {
    fn parse<T: TryFrom<u64>>(&self, id: &str, field: &'static str) -> Result<T, NodeShapeError> {
        let value = match self {
            NumberField::Number(n) => Some(*n),
            NumberField::Text(text) => text.trim().parse::<u64>().ok(),
        };
        value.and_then(|v| T::try_from(v).ok()).ok_or_else(|| NodeShapeError::InvalidNumber {
            id: id.to_string(),
            field,
            value: match self {
                NumberField::Number(n) => n.to_string(),
                NumberField::Text(text) => text.clone(),
            },
        })
    }
}

/// Wire form of [`Node`] before the role is checked against the slave fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: NodeId,
    name: String,
    role: Role,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    ip: String,
    #[serde(default)]
    mac: String,
    #[serde(default)]
    port: Option<NumberField>,
    #[serde(default, alias = "slave_id")]
    slave_id: Option<NumberField>,
    #[serde(flatten)]
    registers: RegisterBanks,
    #[serde(default)]
    identity: Option<DeviceIdentity>,
}

impl TryFrom<RawNode> for Node {
    type Error = NodeShapeError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let slave = match raw.role {
            Role::Master => {
                let configured = raw.port.is_some()
                    || raw.slave_id.is_some()
                    || !raw.registers.all_empty()
                    || raw.identity.as_ref().is_some_and(|i| *i != DeviceIdentity::default());
                if configured {
                    return Err(NodeShapeError::MasterWithSlaveConfig(raw.id));
                }
                None
            }
            Role::Slave => {
                let port = raw
                    .port
                    .as_ref()
                    .ok_or_else(|| NodeShapeError::MissingPort(raw.id.clone()))?
                    .parse(&raw.id, "port")?;
                let slave_id = raw
                    .slave_id
                    .as_ref()
                    .ok_or_else(|| NodeShapeError::MissingSlaveId(raw.id.clone()))?
                    .parse(&raw.id, "slave id")?;
                Some(SlaveDevice {
                    port,
                    slave_id,
                    registers: raw.registers,
                    identity: raw.identity.unwrap_or_default(),
                })
            }
        };

        Ok(Node {
            id: raw.id,
            name: raw.name,
            role: raw.role,
            comment: raw.comment,
            ip: raw.ip,
            mac: raw.mac,
            slave,
        })
    }
}

impl Node {
    pub fn master(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::Master,
            comment: String::new(),
            ip: String::new(),
            mac: String::new(),
            slave: None,
        }
    }

    pub fn slave(id: impl Into<String>, name: impl Into<String>, device: SlaveDevice) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::Slave,
            comment: String::new(),
            ip: String::new(),
            mac: String::new(),
            slave: Some(device),
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }

    pub fn registers(&self) -> Option<&RegisterBanks> {
        self.slave.as_ref().map(|s| &s.registers)
    }
}

/// Protocol operation carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 1,
    ReadDiscreteInputs = 2,
    ReadHoldingRegisters = 3,
    ReadInputRegisters = 4,
    WriteSingleCoil = 5,
    WriteSingleRegister = 6,
    WriteMultipleCoils = 15,
    WriteMultipleRegisters = 16,
    ReadDeviceIdentification = 43,
}

impl FunctionCode {
    pub const ALL: [FunctionCode; 9] = [
        FunctionCode::ReadCoils,
        FunctionCode::ReadDiscreteInputs,
        FunctionCode::ReadHoldingRegisters,
        FunctionCode::ReadInputRegisters,
        FunctionCode::WriteSingleCoil,
        FunctionCode::WriteSingleRegister,
        FunctionCode::WriteMultipleCoils,
        FunctionCode::WriteMultipleRegisters,
        FunctionCode::ReadDeviceIdentification,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Codes 1-4 need a register count
    pub fn is_read(self) -> bool {
        matches!(self.code(), 1..=4)
    }

    /// Codes 5, 6, 15 and 16 carry values
    pub fn is_write(self) -> bool {
        matches!(self.code(), 5 | 6 | 15 | 16)
    }

    /// Everything except device identification targets a register address
    pub fn uses_address(self) -> bool {
        self != FunctionCode::ReadDeviceIdentification
    }
}

impl TryFrom<u8> for FunctionCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FunctionCode::ALL
            .into_iter()
            .find(|fc| fc.code() == value)
            .ok_or(value)
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A scheduled request sent from the master to the slave of an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Offset from simulation start in milliseconds
    pub timestamp: u64,
    #[serde(default)]
    pub recurrent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(alias = "function_code")]
    pub function_code: FunctionCode,
    #[serde(default, alias = "start_address", skip_serializing_if = "Option::is_none")]
    pub start_address: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<u16>,
}

impl Message {
    /// A one-shot message at `timestamp` with no operands
    pub fn new(timestamp: u64, function_code: FunctionCode) -> Self {
        Self {
            timestamp,
            recurrent: false,
            interval: None,
            function_code,
            start_address: None,
            count: None,
            values: Vec::new(),
        }
    }
}

/// A communication link; `source` is always the master endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            messages: Vec::new(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// True when this edge joins `a` and `b` in either direction
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Canvas position; rendering only, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Per-scenario defaults applied to freshly placed slaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefaults {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_slave_id")]
    pub slave_id: u8,
}

fn default_port() -> u16 {
    502
}

fn default_slave_id() -> u8 {
    1
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            slave_id: default_slave_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_code_classes() {
        assert!(FunctionCode::ReadInputRegisters.is_read());
        assert!(!FunctionCode::ReadInputRegisters.is_write());
        assert!(FunctionCode::WriteMultipleCoils.is_write());
        assert!(!FunctionCode::ReadDeviceIdentification.uses_address());
        assert_eq!(FunctionCode::try_from(16), Ok(FunctionCode::WriteMultipleRegisters));
        assert_eq!(FunctionCode::try_from(7), Err(7));
    }

    #[test]
    fn test_slave_node_json_shape() {
        let mut device = SlaveDevice::new(502, 1);
        device.registers.holding_registers = RegisterBank::Sequential(vec![1, 2, 3]);
        device.registers.coils = RegisterBank::Sparse(BTreeMap::from([(1, 1), (4, 0)]));
        let node = Node::slave("node4", "pump", device).with_ip("10.0.0.4");

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["role"], "slave");
        assert_eq!(json["slaveId"], 1);
        assert_eq!(json["holdingRegisters"]["kind"], "sequential");
        assert_eq!(json["holdingRegisters"]["values"][2], 3);
        assert_eq!(json["coils"]["values"]["4"], 0);

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_master_node_has_no_device() {
        let node = Node::master("master_0", "plc").with_ip("10.0.0.2");
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("port").is_none());

        let back: Node = serde_json::from_value(json).unwrap();
        assert!(back.slave.is_none());
    }

    #[test]
    fn test_slave_with_text_port_keeps_registers() {
        let json = serde_json::json!({
            "id": "s", "name": "s", "role": "slave", "port": "502", "slaveId": "3",
            "holdingRegisters": {"kind": "sequential", "values": [1, 2, 3]}
        });
        let node: Node = serde_json::from_value(json).unwrap();
        let device = node.slave.unwrap();
        assert_eq!((device.port, device.slave_id), (502, 3));
        assert_eq!(device.registers.holding_registers, RegisterBank::Sequential(vec![1, 2, 3]));
    }

    #[test]
    fn test_role_must_match_slave_fields() {
        let no_port = serde_json::json!({
            "id": "s", "name": "s", "role": "slave", "slaveId": 1,
            "holdingRegisters": {"kind": "sequential", "values": [1]}
        });
        let err = serde_json::from_value::<Node>(no_port).unwrap_err();
        assert!(err.to_string().contains("has no port"));

        let bad_port = serde_json::json!({"id": "s", "name": "s", "role": "slave", "port": "abc", "slaveId": 1});
        assert!(serde_json::from_value::<Node>(bad_port).is_err());

        let configured_master = serde_json::json!({"id": "m", "name": "m", "role": "master", "port": 502});
        let err = serde_json::from_value::<Node>(configured_master).unwrap_err();
        assert!(err.to_string().contains("carries slave configuration"));
    }

    #[test]
    fn test_message_json_uses_numeric_function_code() {
        let mut message = Message::new(500, FunctionCode::WriteSingleRegister);
        message.start_address = Some(0x10);
        message.values = vec![42];

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["functionCode"], 6);
        assert!(json.get("count").is_none());

        let unknown = serde_json::json!({"timestamp": 0, "functionCode": 9});
        assert!(serde_json::from_value::<Message>(unknown).is_err());
    }

    #[test]
    fn test_edge_connects_either_way() {
        let edge = Edge::new("edge1", "m", "s");
        assert!(edge.connects("s", "m"));
        assert!(edge.touches("m"));
        assert!(!edge.connects("m", "x"));
    }
}
