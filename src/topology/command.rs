//! Command interface of the editing session.
//!
//! Front ends translate user gestures into a [`Command`] and hand it to
//! [`apply_command`]. Field-level rejections come back as notices in the
//! outcome; only structural violations are errors.

use super::model::{EdgePatch, GraphModel, NodePatch};
use super::types::{NodeDefaults, Position};
use super::GraphError;
use crate::utils::field::FieldError;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNode { position: Position, defaults: Option<NodeDefaults> },
    AddEdge { a: String, b: String },
    UpdateNode { id: String, patch: NodePatch },
    UpdateEdge { id: String, patch: EdgePatch },
    Delete { id: String },
    Undo,
    Redo,
    Select { id: Option<String> },
}

/// What a command did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandOutcome {
    /// Id of the element created by an add command
    pub created: Option<String>,
    /// False for undo/redo on an empty stack
    pub changed: bool,
    /// Field inputs that were rejected while the rest of the edit went through
    pub notices: Vec<FieldError>,
}

impl CommandOutcome {
    fn changed() -> Self {
        Self { changed: true, ..Default::default() }
    }

    fn created(id: String) -> Self {
        Self { created: Some(id), changed: true, notices: Vec::new() }
    }

    fn with_notices(notices: Vec<FieldError>) -> Self {
        Self { notices, changed: true, created: None }
    }
}

/// Apply one command to the model
pub fn apply_command(model: &mut GraphModel, command: Command) -> Result<CommandOutcome, GraphError> {
    log::debug!("Applying {:?}", command);
    match command {
        Command::AddNode { position, defaults } => {
            let defaults = defaults.unwrap_or_else(|| model.defaults().clone());
            Ok(CommandOutcome::created(model.add_node(position, &defaults)))
        }
        Command::AddEdge { a, b } => model.add_edge(&a, &b).map(CommandOutcome::created),
        Command::UpdateNode { id, patch } => model.update_node(&id, patch).map(CommandOutcome::with_notices),
        Command::UpdateEdge { id, patch } => model.update_edge(&id, patch).map(CommandOutcome::with_notices),
        Command::Delete { id } => model.delete_element(&id).map(|_| CommandOutcome::changed()),
        Command::Undo => Ok(CommandOutcome { changed: model.undo(), ..Default::default() }),
        Command::Redo => Ok(CommandOutcome { changed: model.redo(), ..Default::default() }),
        Command::Select { id: Some(id) } => model.select(&id).map(|_| CommandOutcome::changed()),
        Command::Select { id: None } => {
            model.clear_selection();
            Ok(CommandOutcome::changed())
        }
    }
}
