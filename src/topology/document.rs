//! Snapshot and persisted document shapes.
//!
//! The persisted network document wraps every node and edge as
//! `{id, data}` and carries the scenario subnet and protocol. Rendering-only
//! state (positions, selection) never reaches it.

use super::types::{Edge, Node, Protocol};
use crate::ip::Subnet;
use serde::{Deserialize, Serialize};

/// Read-only copy of the graph handed to validation and persistence
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    pub ip_network: Subnet,
    pub protocol: Protocol,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_document(&self) -> NetworkDocument {
        NetworkDocument {
            nodes: self
                .nodes
                .iter()
                .map(|n| Element { id: n.id.clone(), data: n.clone() })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| Element { id: e.id.clone(), data: e.clone() })
                .collect(),
            ip_network: self.ip_network,
            protocol: self.protocol,
        }
    }
}

/// One persisted element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element<T> {
    pub id: String,
    pub data: T,
}

/// Network document exchanged with the scenario server
///
/// Every element's `id` must equal the id inside its `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DocumentWire")]
pub struct NetworkDocument {
    pub nodes: Vec<Element<Node>>,
    pub edges: Vec<Element<Edge>>,
    pub ip_network: Subnet,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Element '{element}' wraps data with id '{data}'")]
pub struct MismatchedId {
    pub element: String,
    pub data: String,
}

#[derive(Deserialize)]
struct DocumentWire {
    #[serde(default)]
    nodes: Vec<Element<Node>>,
    #[serde(default)]
    edges: Vec<Element<Edge>>,
    ip_network: Subnet,
    #[serde(default)]
    protocol: Protocol,
}

impl TryFrom<DocumentWire> for NetworkDocument {
    type Error = MismatchedId;

    fn try_from(wire: DocumentWire) -> Result<Self, Self::Error> {
        let ids = wire
            .nodes
            .iter()
            .map(|e| (&e.id, &e.data.id))
            .chain(wire.edges.iter().map(|e| (&e.id, &e.data.id)));
        for (element, data) in ids {
            if element != data {
                return Err(MismatchedId { element: element.clone(), data: data.clone() });
            }
        }

        Ok(NetworkDocument {
            nodes: wire.nodes,
            edges: wire.edges,
            ip_network: wire.ip_network,
            protocol: wire.protocol,
        })
    }
}

impl NetworkDocument {
    pub fn into_snapshot(self) -> GraphSnapshot {
        GraphSnapshot {
            ip_network: self.ip_network,
            protocol: self.protocol,
            nodes: self.nodes.into_iter().map(|e| e.data).collect(),
            edges: self.edges.into_iter().map(|e| e.data).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::SlaveDevice;

    #[test]
    fn test_document_round_trip_keeps_order() {
        let snapshot = GraphSnapshot {
            ip_network: "10.0.0.0/24".parse().unwrap(),
            protocol: Protocol::Modbus,
            nodes: vec![
                Node::master("master_0", "plc").with_ip("10.0.0.2"),
                Node::slave("slave_0", "meter", SlaveDevice::new(502, 1)).with_ip("10.0.0.3"),
            ],
            edges: vec![Edge::new("edge1", "master_0", "slave_0")],
        };

        let json = snapshot.to_document().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ip_network"], "10.0.0.0/24");
        assert_eq!(value["protocol"], "modbus");
        assert_eq!(value["nodes"][1]["id"], "slave_0");
        assert_eq!(value["nodes"][1]["data"]["port"], 502);
        assert!(value["nodes"][0].get("position").is_none());

        let back = NetworkDocument::from_json(&json).unwrap().into_snapshot();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_rejects_element_id_mismatch() {
        let json = r#"{
            "nodes": [{"id": "a", "data": {"id": "b", "name": "plc", "role": "master"}}],
            "edges": [],
            "ip_network": "10.0.0.0/24"
        }"#;
        let err = NetworkDocument::from_json(json).unwrap_err();
        assert!(err.to_string().contains("Element 'a' wraps data with id 'b'"));
    }

    #[test]
    fn test_rejects_slave_without_device_fields() {
        let json = r#"{
            "nodes": [{"id": "s", "data": {"id": "s", "name": "s", "role": "slave",
                "holdingRegisters": {"kind": "sequential", "values": [1, 2, 3]}}}],
            "edges": [],
            "ip_network": "10.0.0.0/24"
        }"#;
        assert!(NetworkDocument::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_bad_subnet() {
        let json = r#"{"nodes": [], "edges": [], "ip_network": "10.0.0.0/99", "protocol": "modbus"}"#;
        assert!(NetworkDocument::from_json(json).is_err());
    }
}
