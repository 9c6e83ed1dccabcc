//! Simulation run lifecycle.
//!
//! This module contains the run state machine, its poll scheduling, progress
//! display values and a blocking driver.

pub mod controller;
pub mod progress;
pub mod session;
pub mod ticker;

pub use controller::{RunController, RunState};
pub use progress::RunProgress;
pub use session::run_to_completion;
pub use ticker::{PollTicker, PollTicket};

use crate::api::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: &'static str, action: &'static str },
    #[error("Invalid simulation time: {0}")]
    InvalidDuration(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}
