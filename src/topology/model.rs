//! In-memory topology model.
//!
//! `GraphModel` owns the devices and links of one editing session. Every
//! structural mutation updates the undo history in the same call and reports
//! the affected elements to the attached [`RenderSink`].

use super::document::GraphSnapshot;
use super::events::{GraphChange, LogSink, RenderSink};
use super::registers::assign_bank;
use super::types::{
    DeviceIdentity, Edge, EdgeId, Node, NodeDefaults, NodeId, Position, Protocol, RegisterBank,
    RegisterKind, Role, SlaveDevice,
};
use super::GraphError;
use crate::history::{HistoryEntry, HistoryManager, Operation, PlacedNode, SubGraph};
use crate::ip::{self, Subnet};
use crate::schedule::{self, RawMessage};
use crate::utils::field::FieldError;
use crate::utils::mac::assign_mac;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::Ipv4Addr;

/// Raw text for one register bank as entered in a form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BankInput {
    pub kind: RegisterKind,
    pub text: String,
}

impl BankInput {
    pub fn sequential(text: impl Into<String>) -> Self {
        Self { kind: RegisterKind::Sequential, text: text.into() }
    }

    pub fn sparse(text: impl Into<String>) -> Self {
        Self { kind: RegisterKind::Sparse, text: text.into() }
    }
}

/// Register form; banks left as `None` are not touched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegisterForm {
    pub discrete_inputs: Option<BankInput>,
    pub coils: Option<BankInput>,
    pub input_registers: Option<BankInput>,
    pub holding_registers: Option<BankInput>,
}

/// Field-level changes to a node; `None` leaves a field as it is
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePatch {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub role: Option<Role>,
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub port: Option<u16>,
    pub slave_id: Option<u8>,
    pub registers: Option<RegisterForm>,
    pub identity: Option<DeviceIdentity>,
}

/// Changes to an edge: the message rows of its schedule form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgePatch {
    pub messages: Option<Vec<RawMessage>>,
}

pub struct GraphModel {
    ip_network: Subnet,
    protocol: Protocol,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    positions: HashMap<NodeId, Position>,
    selected: Option<String>,
    history: HistoryManager,
    defaults: NodeDefaults,
    sink: Box<dyn RenderSink>,
    node_seq: usize,
    edge_seq: usize,
}

impl fmt::Debug for GraphModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphModel")
            .field("ip_network", &self.ip_network)
            .field("protocol", &self.protocol)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("selected", &self.selected)
            .field("history", &self.history)
            .finish()
    }
}

impl GraphModel {
    pub fn new(ip_network: Subnet, protocol: Protocol) -> Self {
        Self {
            ip_network,
            protocol,
            nodes: Vec::new(),
            edges: Vec::new(),
            positions: HashMap::new(),
            selected: None,
            history: HistoryManager::default(),
            defaults: NodeDefaults::default(),
            sink: Box::new(LogSink),
            node_seq: 0,
            edge_seq: 0,
        }
    }

    /// Start a session from a previously saved graph. History starts empty.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut model = Self::new(snapshot.ip_network, snapshot.protocol);
        model.nodes = snapshot.nodes;
        model.edges = snapshot.edges;
        info!(
            "Loaded graph with {} nodes and {} edges on {}",
            model.nodes.len(),
            model.edges.len(),
            model.ip_network
        );
        model
    }

    pub fn with_defaults(mut self, defaults: NodeDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_history(mut self, history: HistoryManager) -> Self {
        self.history = history;
        self
    }

    pub fn set_render_sink(&mut self, sink: Box<dyn RenderSink>) {
        self.sink = sink;
    }

    pub fn ip_network(&self) -> Subnet {
        self.ip_network
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn defaults(&self) -> &NodeDefaults {
        &self.defaults
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some() || self.edge(id).is_some()
    }

    pub fn incident_edges(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.touches(node_id)).collect()
    }

    /// The edge joining `a` and `b`, whichever direction it is stored in
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.connects(a, b))
    }

    pub fn position(&self, node_id: &str) -> Option<Position> {
        self.positions.get(node_id).copied()
    }

    /// Move a node on the canvas; layout changes are not recorded in history
    pub fn set_position(&mut self, node_id: &str, position: Position) -> Result<(), GraphError> {
        if self.node(node_id).is_none() {
            return Err(GraphError::UnknownNode(node_id.to_string()));
        }
        self.positions.insert(node_id.to_string(), position);
        Ok(())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: &str) -> Result<(), GraphError> {
        if !self.contains(id) {
            return Err(GraphError::UnknownElement(id.to_string()));
        }
        self.selected = Some(id.to_string());
        self.sink.notify(&GraphChange::SelectionChanged(self.selected.clone()));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.sink.notify(&GraphChange::SelectionChanged(None));
        }
    }

    /// Parsed addresses currently held by nodes
    pub fn existing_ips(&self) -> HashSet<Ipv4Addr> {
        ip::collect_addresses(self.nodes.iter().map(|n| n.ip.as_str()))
    }

    /// Read-only copy for validation and saving
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            ip_network: self.ip_network,
            protocol: self.protocol,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Place a new slave device with empty registers and a free address
    pub fn add_node(&mut self, position: Position, defaults: &NodeDefaults) -> NodeId {
        let id = self.next_node_id();
        let assigned = ip::assign("", "", &self.ip_network, &self.existing_ips());
        if let Some(e) = &assigned.error {
            warn!("Node {} placed without an address: {}", id, e);
        }

        let node = Node::slave(id.clone(), id.clone(), SlaveDevice::new(defaults.port, defaults.slave_id))
            .with_ip(assigned.value);

        self.insert_node(node.clone(), Some(position));
        self.history.record(HistoryEntry::added(SubGraph::node(node, Some(position))));
        info!("Added node {} at ({}, {})", id, position.x, position.y);
        id
    }

    /// Connect two devices with opposite roles
    ///
    /// The stored edge always runs from the master to the slave, whichever
    /// endpoint was picked first.
    pub fn add_edge(&mut self, a: &str, b: &str) -> Result<EdgeId, GraphError> {
        let first = self.node(a).ok_or_else(|| GraphError::UnknownNode(a.to_string()))?;
        let second = self.node(b).ok_or_else(|| GraphError::UnknownNode(b.to_string()))?;

        if first.role == second.role {
            return Err(GraphError::SameRole { role: first.role });
        }
        if self.edge_between(a, b).is_some() {
            return Err(GraphError::DuplicateEdge { a: a.to_string(), b: b.to_string() });
        }

        let (source, target) = if first.role == Role::Master { (a, b) } else { (b, a) };
        let edge = Edge::new(self.next_edge_id(), source, target);
        let id = edge.id.clone();

        self.insert_edge(edge.clone());
        self.history.record(HistoryEntry::added(SubGraph::edge(edge)));
        info!("Connected {} -> {} as {}", source, target, id);
        Ok(id)
    }

    /// Apply form input to a node
    ///
    /// Structural violations reject the whole patch. Malformed field input
    /// keeps that field's previous value and is returned as a notice.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<Vec<FieldError>, GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;

        if let Some(role) = patch.role {
            if role != self.nodes[index].role && self.edges.iter().any(|e| e.touches(id)) {
                return Err(GraphError::NodeHasConnections(id.to_string()));
            }
        }

        let existing_ips = self.existing_ips();
        let subnet = self.ip_network;
        let defaults = self.defaults.clone();
        let mut notices = Vec::new();
        let node = &mut self.nodes[index];

        if let Some(name) = patch.name {
            let name = name.trim();
            if !name.is_empty() {
                node.name = name.to_string();
            }
        }
        if let Some(comment) = patch.comment {
            node.comment = comment;
        }
        if let Some(role) = patch.role {
            if role != node.role {
                node.role = role;
                node.slave = match role {
                    Role::Master => None,
                    Role::Slave => Some(SlaveDevice::new(defaults.port, defaults.slave_id)),
                };
                info!("Node {} is now a {}", id, role);
            }
        }
        if let Some(text) = patch.ip {
            let (value, error) = ip::assign(&text, &node.ip, &subnet, &existing_ips).into_parts();
            node.ip = value;
            notices.extend(error);
        }
        if let Some(text) = patch.mac {
            let (value, error) = assign_mac(&text, &node.mac).into_parts();
            node.mac = value;
            notices.extend(error);
        }

        match node.slave.as_mut() {
            Some(device) => {
                if let Some(port) = patch.port {
                    device.port = port;
                }
                if let Some(slave_id) = patch.slave_id {
                    device.slave_id = slave_id;
                }
                if let Some(form) = patch.registers {
                    let banks = &mut device.registers;
                    apply_bank(&mut banks.discrete_inputs, form.discrete_inputs, &mut notices);
                    apply_bank(&mut banks.coils, form.coils, &mut notices);
                    apply_bank(&mut banks.input_registers, form.input_registers, &mut notices);
                    apply_bank(&mut banks.holding_registers, form.holding_registers, &mut notices);
                }
                if let Some(identity) = patch.identity {
                    device.identity = identity;
                }
            }
            None => {
                if patch.port.is_some() || patch.slave_id.is_some() || patch.registers.is_some() || patch.identity.is_some() {
                    debug!("Ignoring slave-only fields for master node {}", id);
                }
            }
        }

        let updated = node.clone();
        self.history.clear_redo();
        self.sink.notify(&GraphChange::NodeUpdated(updated));
        debug!("Updated node {} with {} notices", id, notices.len());
        Ok(notices)
    }

    /// Apply the schedule form of an edge
    ///
    /// When any row is malformed the previous schedule is kept and a single
    /// notice lists every invalid row.
    pub fn update_edge(&mut self, id: &str, patch: EdgePatch) -> Result<Vec<FieldError>, GraphError> {
        let edge = self
            .edges
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| GraphError::UnknownEdge(id.to_string()))?;

        let mut notices = Vec::new();
        if let Some(rows) = patch.messages {
            match schedule::parse_rows(&rows) {
                Ok(messages) => edge.messages = messages,
                Err(e) => {
                    warn!("Keeping previous schedule of {}: {}", id, e);
                    notices.push(e);
                }
            }
        }

        let updated = edge.clone();
        self.history.clear_redo();
        self.sink.notify(&GraphChange::EdgeUpdated(updated));
        Ok(notices)
    }

    /// Delete a node (with its incident edges) or an edge as one undoable unit
    pub fn delete_element(&mut self, id: &str) -> Result<(), GraphError> {
        let payload = if self.node(id).is_some() {
            self.take_node_with_edges(id)
        } else if self.edge(id).is_some() {
            let edge = self.take_edge(id).ok_or_else(|| GraphError::UnknownEdge(id.to_string()))?;
            SubGraph::edge(edge)
        } else {
            return Err(GraphError::UnknownElement(id.to_string()));
        };

        info!(
            "Deleted {} ({} nodes, {} edges removed)",
            id,
            payload.nodes.len(),
            payload.edges.len()
        );
        self.drop_selection_within(&payload);
        self.history.record(HistoryEntry::deleted(payload));
        Ok(())
    }

    /// Revert the most recent structural edit. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(mut entry) = self.history.take_undo() else {
            return false;
        };
        match entry.operation {
            Operation::Add => entry.payload = self.remove_subgraph(&entry.payload),
            Operation::Delete => self.restore_subgraph(&entry.payload),
        }
        debug!("Undid {:?} of {:?}", entry.operation, entry.payload.element_ids());
        self.history.push_redo(entry);
        true
    }

    /// Re-apply the most recently undone edit. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(mut entry) = self.history.take_redo() else {
            return false;
        };
        match entry.operation {
            Operation::Add => self.restore_subgraph(&entry.payload),
            Operation::Delete => entry.payload = self.remove_subgraph(&entry.payload),
        }
        debug!("Redid {:?} of {:?}", entry.operation, entry.payload.element_ids());
        self.history.push_undo(entry);
        true
    }

    fn next_node_id(&mut self) -> NodeId {
        loop {
            self.node_seq += 1;
            let id = format!("node{}", self.node_seq);
            if !self.contains(&id) {
                return id;
            }
        }
    }

    fn next_edge_id(&mut self) -> EdgeId {
        loop {
            self.edge_seq += 1;
            let id = format!("edge{}", self.edge_seq);
            if !self.contains(&id) {
                return id;
            }
        }
    }

    fn insert_node(&mut self, node: Node, position: Option<Position>) {
        if let Some(position) = position {
            self.positions.insert(node.id.clone(), position);
        }
        self.sink.notify(&GraphChange::NodeAdded { node: node.clone(), position });
        self.nodes.push(node);
    }

    fn insert_edge(&mut self, edge: Edge) {
        self.sink.notify(&GraphChange::EdgeAdded(edge.clone()));
        self.edges.push(edge);
    }

    fn take_edge(&mut self, id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id == id)?;
        let edge = self.edges.remove(index);
        self.sink.notify(&GraphChange::Removed(edge.id.clone()));
        Some(edge)
    }

    /// Remove a node and its incident edges, returning all of them
    fn take_node_with_edges(&mut self, id: &str) -> SubGraph {
        let mut removed = SubGraph::default();

        let incident: Vec<EdgeId> = self.incident_edges(id).into_iter().map(|e| e.id.clone()).collect();
        for edge_id in incident {
            if let Some(edge) = self.take_edge(&edge_id) {
                removed.edges.push(edge);
            }
        }

        if let Some(index) = self.nodes.iter().position(|n| n.id == id) {
            let node = self.nodes.remove(index);
            let position = self.positions.remove(id);
            self.sink.notify(&GraphChange::Removed(node.id.clone()));
            removed.nodes.push(PlacedNode { node, position });
        }

        removed
    }

    /// Remove the elements named by `payload`, capturing their current state
    fn remove_subgraph(&mut self, payload: &SubGraph) -> SubGraph {
        let mut captured = SubGraph::default();

        for edge in &payload.edges {
            if let Some(current) = self.take_edge(&edge.id) {
                captured.edges.push(current);
            }
        }
        for placed in &payload.nodes {
            if self.node(&placed.node.id).is_some() {
                let removed = self.take_node_with_edges(&placed.node.id);
                captured.edges.extend(removed.edges);
                captured.nodes.extend(removed.nodes);
            }
        }

        self.drop_selection_within(&captured);
        captured
    }

    /// Re-insert previously removed elements, nodes before edges
    fn restore_subgraph(&mut self, payload: &SubGraph) {
        for placed in &payload.nodes {
            if self.contains(&placed.node.id) {
                warn!("Cannot restore node {}: id already in use", placed.node.id);
                continue;
            }
            self.insert_node(placed.node.clone(), placed.position);
        }
        for edge in &payload.edges {
            if self.contains(&edge.id) {
                warn!("Cannot restore edge {}: id already in use", edge.id);
                continue;
            }
            if self.node(&edge.source).is_none() || self.node(&edge.target).is_none() {
                warn!("Cannot restore edge {}: endpoint missing", edge.id);
                continue;
            }
            self.insert_edge(edge.clone());
        }
        self.drop_selection_within(payload);
    }

    fn drop_selection_within(&mut self, payload: &SubGraph) {
        let hit = match &self.selected {
            Some(selected) => payload.element_ids().iter().any(|id| id == selected),
            None => false,
        };
        if hit {
            self.clear_selection();
        }
    }
}

fn apply_bank(bank: &mut RegisterBank, input: Option<BankInput>, notices: &mut Vec<FieldError>) {
    if let Some(input) = input {
        let (value, error) = assign_bank(input.kind, &input.text, bank).into_parts();
        *bank = value;
        notices.extend(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::RawMessage;
    use crate::topology::types::FunctionCode;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn model() -> GraphModel {
        GraphModel::new("10.0.0.0/24".parse().unwrap(), Protocol::Modbus)
    }

    fn at(x: f64) -> Position {
        Position::new(x, 0.0)
    }

    fn master(model: &mut GraphModel) -> NodeId {
        let id = model.add_node(at(0.0), &NodeDefaults::default());
        model
            .update_node(&id, NodePatch { role: Some(Role::Master), ..Default::default() })
            .unwrap();
        id
    }

    fn sorted(snapshot: GraphSnapshot) -> GraphSnapshot {
        let mut snapshot = snapshot;
        snapshot.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.edges.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot
    }

    #[test]
    fn test_add_node_defaults() {
        let mut model = model();
        let first = model.add_node(at(10.0), &NodeDefaults::default());
        let second = model.add_node(at(20.0), &NodeDefaults { port: 5020, slave_id: 7 });

        // 10.0.0.1 is the gateway
        let node = model.node(&first).unwrap();
        assert_eq!(node.role, Role::Slave);
        assert_eq!(node.ip, "10.0.0.2");
        assert!(node.registers().unwrap().all_empty());

        let node = model.node(&second).unwrap();
        assert_eq!(node.ip, "10.0.0.3");
        assert_eq!(node.slave.as_ref().unwrap().port, 5020);
        assert_eq!(node.slave.as_ref().unwrap().slave_id, 7);
        assert_eq!(model.position(&second), Some(at(20.0)));
        assert_eq!(model.history().undo_len(), 2);
    }

    #[test]
    fn test_add_edge_orients_master_to_slave() {
        let mut model = model();
        let m = master(&mut model);
        let s = model.add_node(at(1.0), &NodeDefaults::default());

        let id = model.add_edge(&s, &m).unwrap();
        let edge = model.edge(&id).unwrap();
        assert_eq!(edge.source, m);
        assert_eq!(edge.target, s);
    }

    #[test]
    fn test_add_edge_rejections() {
        let mut model = model();
        let m = master(&mut model);
        let s1 = model.add_node(at(1.0), &NodeDefaults::default());
        let s2 = model.add_node(at(2.0), &NodeDefaults::default());

        assert_eq!(model.add_edge(&s1, &s2), Err(GraphError::SameRole { role: Role::Slave }));
        model.add_edge(&m, &s1).unwrap();
        assert!(matches!(model.add_edge(&s1, &m), Err(GraphError::DuplicateEdge { .. })));
        assert!(matches!(model.add_edge(&m, "ghost"), Err(GraphError::UnknownNode(_))));
        assert_eq!(model.edges().len(), 1);
    }

    #[test]
    fn test_role_change_blocked_by_connections() {
        let mut model = model();
        let m = master(&mut model);
        let s = model.add_node(at(1.0), &NodeDefaults::default());
        model.add_edge(&m, &s).unwrap();

        let patch = NodePatch { role: Some(Role::Master), name: Some("renamed".into()), ..Default::default() };
        assert_eq!(model.update_node(&s, patch), Err(GraphError::NodeHasConnections(s.clone())));
        assert_eq!(model.node(&s).unwrap().role, Role::Slave);
        assert_eq!(model.node(&s).unwrap().name, s);
    }

    #[test]
    fn test_update_node_field_fallbacks() {
        let mut model = model();
        let s = model.add_node(at(1.0), &NodeDefaults::default());

        let patch = NodePatch {
            name: Some("  ".into()),
            ip: Some("10.0.0.999".into()),
            mac: Some("aa-bb-cc-dd-ee-ff".into()),
            registers: Some(RegisterForm {
                coils: Some(BankInput::sequential("1,0,1")),
                holding_registers: Some(BankInput::sparse("0:3")),
                ..Default::default()
            }),
            ..Default::default()
        };
        let notices = model.update_node(&s, patch).unwrap();

        let node = model.node(&s).unwrap();
        assert_eq!(node.name, s);
        assert_eq!(node.ip, "10.0.0.2");
        assert_eq!(node.mac, "AA:BB:CC:DD:EE:FF");
        let banks = node.registers().unwrap();
        assert_eq!(banks.coils, RegisterBank::Sequential(vec![1, 0, 1]));
        assert!(banks.holding_registers.is_empty());
        assert_eq!(notices.len(), 2);
        assert!(notices.contains(&FieldError::InvalidIp("10.0.0.999".into())));
        assert!(notices.contains(&FieldError::RegisterKeyNotPositive));
    }

    #[test]
    fn test_role_switch_replaces_device() {
        let mut model = model();
        let id = model.add_node(at(0.0), &NodeDefaults::default());
        model
            .update_node(&id, NodePatch { role: Some(Role::Master), ..Default::default() })
            .unwrap();
        assert!(model.node(&id).unwrap().slave.is_none());

        model
            .update_node(&id, NodePatch { role: Some(Role::Slave), ..Default::default() })
            .unwrap();
        assert_eq!(model.node(&id).unwrap().slave.as_ref().unwrap().port, 502);
    }

    #[test]
    fn test_update_edge_keeps_schedule_on_bad_rows() {
        let mut model = model();
        let m = master(&mut model);
        let s = model.add_node(at(1.0), &NodeDefaults::default());
        let e = model.add_edge(&m, &s).unwrap();

        let good = RawMessage { timestamp: "0".into(), function_code: "3".into(), count: "2".into(), ..Default::default() };
        model.update_edge(&e, EdgePatch { messages: Some(vec![good.clone()]) }).unwrap();
        assert_eq!(model.edge(&e).unwrap().messages.len(), 1);

        let bad = RawMessage { timestamp: "x".into(), function_code: "3".into(), ..Default::default() };
        let notices = model
            .update_edge(&e, EdgePatch { messages: Some(vec![good, bad]) })
            .unwrap();
        assert_eq!(notices, vec![FieldError::InvalidMessageRows(vec![2])]);
        let messages = &model.edge(&e).unwrap().messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].function_code, FunctionCode::ReadHoldingRegisters);
    }

    #[test]
    fn test_delete_node_takes_edges_and_undo_restores_together() {
        let mut model = model();
        let m = master(&mut model);
        let s1 = model.add_node(at(1.0), &NodeDefaults::default());
        let s2 = model.add_node(at(2.0), &NodeDefaults::default());
        model.add_edge(&m, &s1).unwrap();
        model.add_edge(&m, &s2).unwrap();
        let before = sorted(model.snapshot());

        model.delete_element(&m).unwrap();
        assert!(model.node(&m).is_none());
        assert!(model.edges().is_empty());
        assert_eq!(model.history().undo_len(), 6);

        assert!(model.undo());
        assert_eq!(sorted(model.snapshot()), before);
        assert_eq!(model.position(&m), Some(at(0.0)));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut model = model();
        let m = master(&mut model);
        let s = model.add_node(at(1.0), &NodeDefaults::default());
        model.add_edge(&m, &s).unwrap();
        model.delete_element(&s).unwrap();

        let states: Vec<GraphSnapshot> = (0..4)
            .map(|_| {
                let state = sorted(model.snapshot());
                assert!(model.undo());
                state
            })
            .collect();
        assert!(model.nodes().is_empty());
        assert!(!model.undo());

        for state in states.iter().rev() {
            assert!(model.redo());
            assert_eq!(&sorted(model.snapshot()), state);
        }
        assert!(!model.redo());
    }

    #[test]
    fn test_new_mutation_discards_redo() {
        let mut model = model();
        model.add_node(at(0.0), &NodeDefaults::default());
        assert!(model.undo());
        model.add_node(at(1.0), &NodeDefaults::default());
        assert!(!model.redo());
        assert_eq!(model.nodes().len(), 1);
    }

    #[test]
    fn test_undo_of_add_keeps_later_edits_for_redo() {
        let mut model = model();
        let s = model.add_node(at(0.0), &NodeDefaults::default());
        model
            .update_node(&s, NodePatch { comment: Some("flow meter".into()), ..Default::default() })
            .unwrap();
        model.undo();
        model.redo();
        assert_eq!(model.node(&s).unwrap().comment, "flow meter");
    }

    #[test]
    fn test_selection_cleared_when_element_goes_away() {
        let mut model = model();
        let s = model.add_node(at(0.0), &NodeDefaults::default());
        model.select(&s).unwrap();
        model.delete_element(&s).unwrap();
        assert_eq!(model.selected(), None);
        model.undo();
        assert!(model.node(&s).is_some());
        assert_eq!(model.selected(), None);
    }

    #[test]
    fn test_sink_receives_incremental_changes() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::clone(&changes);
        let mut model = model();
        model.set_render_sink(Box::new(move |change: &GraphChange| recorder.borrow_mut().push(change.clone())));

        let m = master(&mut model);
        let s = model.add_node(at(1.0), &NodeDefaults::default());
        let e = model.add_edge(&m, &s).unwrap();
        changes.borrow_mut().clear();

        model.delete_element(&s).unwrap();
        assert_eq!(
            *changes.borrow(),
            vec![GraphChange::Removed(e.clone()), GraphChange::Removed(s.clone())]
        );

        changes.borrow_mut().clear();
        model.undo();
        let recorded = changes.borrow();
        assert_eq!(recorded.len(), 2);
        assert!(matches!(&recorded[0], GraphChange::NodeAdded { node, .. } if node.id == s));
        assert!(matches!(&recorded[1], GraphChange::EdgeAdded(edge) if edge.id == e));
    }

    #[test]
    fn test_generated_ids_skip_loaded_ones() {
        let snapshot = GraphSnapshot {
            ip_network: "10.0.0.0/24".parse().unwrap(),
            protocol: Protocol::Modbus,
            nodes: vec![Node::master("node1", "node1").with_ip("10.0.0.1")],
            edges: vec![],
        };
        let mut model = GraphModel::from_snapshot(snapshot);
        let id = model.add_node(at(0.0), &NodeDefaults::default());
        assert_eq!(id, "node2");
        assert_eq!(model.node(&id).unwrap().ip, "10.0.0.2");
    }
}
