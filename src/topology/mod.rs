//! Network topology module.
//!
//! This module contains the device/link data model, the editable graph with
//! its command interface, and the persisted document shape.

pub mod command;
pub mod document;
pub mod events;
pub mod model;
pub mod registers;
pub mod types;

// Re-export key types and functions for easier access
pub use command::{apply_command, Command, CommandOutcome};
pub use document::{Element, GraphSnapshot, NetworkDocument};
pub use events::{GraphChange, LogSink, RenderSink};
pub use model::{BankInput, EdgePatch, GraphModel, NodePatch, RegisterForm};
pub use types::{
    DeviceIdentity, Edge, EdgeId, FunctionCode, Message, Node, NodeDefaults, NodeId, Position, Protocol,
    NodeShapeError, RegisterBank, RegisterBanks, RegisterKind, Role, SlaveDevice,
};

/// Structural violations that reject a whole edit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Unknown node '{0}'")]
    UnknownNode(String),
    #[error("Unknown edge '{0}'")]
    UnknownEdge(String),
    #[error("No element with id '{0}'")]
    UnknownElement(String),
    #[error("Cannot connect two {role} nodes")]
    SameRole { role: Role },
    #[error("Nodes '{a}' and '{b}' are already connected")]
    DuplicateEdge { a: String, b: String },
    #[error("Node '{0}' has connections; remove them before changing its role")]
    NodeHasConnections(String),
}
