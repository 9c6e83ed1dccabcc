//! Change notifications for the rendering collaborator.
//!
//! The model never asks a renderer to redraw everything; it reports exactly
//! which elements appeared, changed or went away.

use super::types::{Edge, Node, Position};

/// A single change to the element set
#[derive(Debug, Clone, PartialEq)]
pub enum GraphChange {
    NodeAdded { node: Node, position: Option<Position> },
    EdgeAdded(Edge),
    NodeUpdated(Node),
    EdgeUpdated(Edge),
    Removed(String),
    SelectionChanged(Option<String>),
}

/// Receiver of graph changes, typically a canvas adapter
pub trait RenderSink {
    fn notify(&mut self, change: &GraphChange);
}

/// Sink that only logs, used when no renderer is attached
#[derive(Debug, Default)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn notify(&mut self, change: &GraphChange) {
        match change {
            GraphChange::NodeAdded { node, .. } => log::debug!("render: add node {}", node.id),
            GraphChange::EdgeAdded(edge) => log::debug!("render: add edge {}", edge.id),
            GraphChange::NodeUpdated(node) => log::debug!("render: update node {}", node.id),
            GraphChange::EdgeUpdated(edge) => log::debug!("render: update edge {}", edge.id),
            GraphChange::Removed(id) => log::debug!("render: remove {}", id),
            GraphChange::SelectionChanged(id) => log::debug!("render: selection {:?}", id),
        }
    }
}

impl<F> RenderSink for F
where
    F: FnMut(&GraphChange),
{
    fn notify(&mut self, change: &GraphChange) {
        self(change)
    }
}
