//! Undo/redo history of structural edits.
//!
//! Each entry records one add or delete together with the sub-graph it
//! touched: a single node, a single edge, or a node with its incident edges.
//! Applying an entry in reverse is the job of the graph model; this module
//! only owns the two stacks and the linear-history discipline.

use crate::topology::types::{Edge, Node, Position};

/// Kind of structural edit recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Delete,
}

/// A node together with its canvas position at the time it was captured
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub node: Node,
    pub position: Option<Position>,
}

/// The elements affected by one structural edit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubGraph {
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<Edge>,
}

impl SubGraph {
    pub fn node(node: Node, position: Option<Position>) -> Self {
        Self {
            nodes: vec![PlacedNode { node, position }],
            edges: Vec::new(),
        }
    }

    pub fn edge(edge: Edge) -> Self {
        Self {
            nodes: Vec::new(),
            edges: vec![edge],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Ids of every element in the sub-graph, nodes first
    pub fn element_ids(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|p| p.node.id.clone())
            .chain(self.edges.iter().map(|e| e.id.clone()))
            .collect()
    }
}

/// One recorded edit
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub operation: Operation,
    pub payload: SubGraph,
}

impl HistoryEntry {
    pub fn added(payload: SubGraph) -> Self {
        Self { operation: Operation::Add, payload }
    }

    pub fn deleted(payload: SubGraph) -> Self {
        Self { operation: Operation::Delete, payload }
    }
}

/// Undo and redo stacks
///
/// `max_entries` bounds the undo stack; the oldest entries are dropped
/// first.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    max_entries: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

pub const DEFAULT_MAX_ENTRIES: usize = 500;

impl HistoryManager {
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Record a fresh edit. The redo stack is discarded.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.redo.clear();
        self.push_undo(entry);
    }

    /// Drop every redo entry; called on any non-structural mutation too
    pub fn clear_redo(&mut self) {
        if !self.redo.is_empty() {
            log::debug!("Discarding {} redo entries", self.redo.len());
            self.redo.clear();
        }
    }

    /// Pop the most recent edit for undoing
    pub fn take_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop()
    }

    /// Pop the most recently undone edit for redoing
    pub fn take_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    /// Push an entry that has just been undone
    pub fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo.push(entry);
    }

    /// Push an entry that has just been redone, keeping the redo stack
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo.push(entry);
        if self.undo.len() > self.max_entries {
            let overflow = self.undo.len() - self.max_entries;
            self.undo.drain(..overflow);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}
