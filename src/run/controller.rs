//! Simulation run state machine.
//!
//! ```text
//! Idle -> Configuring -> Submitting -> Running -> Completed
//!                                        |   \--> Stopped
//!                                        \------> Failed (start rejected)
//! ```
//!
//! The controller is driven by explicit calls carrying the current instant,
//! so it can be stepped deterministically in tests. [`super::session`] wraps
//! it in a blocking loop for the command line.

use super::progress::RunProgress;
use super::ticker::{PollTicker, PollTicket};
use super::RunError;
use crate::api::types::{RunRequest, RunStatus};
use crate::api::{ApiError, SimulationApi};
use crate::utils::duration::parse_simulation_time;
use log::{debug, info, warn};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Idle,
    /// Settings dialog open
    Configuring,
    /// Duration accepted, start request not yet answered
    Submitting { duration: u64 },
    Running { output: String, progress: RunProgress },
    Completed { output: String },
    Stopped,
    Failed { error: String },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed { .. } | RunState::Stopped | RunState::Failed { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Configuring => "configuring",
            RunState::Submitting { .. } => "submitting",
            RunState::Running { .. } => "running",
            RunState::Completed { .. } => "completed",
            RunState::Stopped => "stopped",
            RunState::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct RunController {
    state: RunState,
    ticker: PollTicker,
    last_progress: Option<RunProgress>,
}

impl RunController {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: RunState::Idle,
            ticker: PollTicker::new(poll_interval),
            last_progress: None,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Instant of the next scheduled poll, if polling is active
    pub fn next_poll(&self) -> Option<Instant> {
        self.ticker.next_due()
    }

    /// Most recent progress of the current or last run
    pub fn last_progress(&self) -> Option<RunProgress> {
        self.last_progress
    }

    pub fn is_polling(&self) -> bool {
        self.ticker.is_active()
    }

    fn transition(&mut self, next: RunState) {
        info!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }

    fn invalid(&self, action: &'static str) -> RunError {
        RunError::InvalidTransition { state: self.state.name(), action }
    }

    /// Open the run settings. Allowed when idle or after a finished run.
    pub fn open_settings(&mut self) -> Result<(), RunError> {
        match self.state {
            RunState::Idle | RunState::Completed { .. } | RunState::Stopped | RunState::Failed { .. } => {
                self.transition(RunState::Configuring);
                Ok(())
            }
            _ => Err(self.invalid("open settings")),
        }
    }

    pub fn cancel_settings(&mut self) -> Result<(), RunError> {
        match self.state {
            RunState::Configuring => {
                self.transition(RunState::Idle);
                Ok(())
            }
            _ => Err(self.invalid("cancel settings")),
        }
    }

    /// Accept the duration text. Invalid input leaves the settings open.
    pub fn submit(&mut self, duration: &str) -> Result<u64, RunError> {
        if self.state != RunState::Configuring {
            return Err(self.invalid("submit"));
        }
        let seconds = parse_simulation_time(duration).map_err(|e| {
            warn!("Rejected simulation time '{}': {}", duration, e);
            RunError::InvalidDuration(e)
        })?;
        self.transition(RunState::Submitting { duration: seconds });
        Ok(seconds)
    }

    /// Ask the server to start `scenario`
    ///
    /// A rejected start is not an error of this call; it moves the machine to
    /// `Failed` carrying the server's message.
    pub fn start(&mut self, api: &dyn SimulationApi, scenario: &str, now: Instant) -> Result<(), RunError> {
        let RunState::Submitting { duration } = self.state else {
            return Err(self.invalid("start"));
        };

        match api.start_run(scenario, &RunRequest { simulation_time: duration }) {
            Ok(started) => {
                info!("Simulation of {} writing to {}", scenario, started.file_path);
                self.ticker.start(now);
                self.last_progress = Some(RunProgress::started(duration));
                self.transition(RunState::Running {
                    output: started.file_path,
                    progress: RunProgress::started(duration),
                });
            }
            Err(e) => {
                warn!("Simulation of {} failed to start: {}", scenario, e);
                self.transition(RunState::Failed { error: e.to_string() });
            }
        }
        Ok(())
    }

    /// Ticket for a status poll if one is due at `now`
    pub fn poll_ticket(&mut self, now: Instant) -> Option<PollTicket> {
        if !self.state.is_running() {
            return None;
        }
        self.ticker.poll_due(now)
    }

    /// Apply the response to a poll. Returns false when it was discarded.
    ///
    /// Transport failures keep the run going; the next tick polls again.
    pub fn handle_poll(&mut self, ticket: PollTicket, response: Result<RunStatus, ApiError>) -> bool {
        if !self.ticker.accept(ticket) {
            debug!("Discarding stale poll response");
            return false;
        }

        let status = match response {
            Ok(status) => status,
            Err(e) => {
                warn!("Status poll failed: {}", e);
                return true;
            }
        };

        let RunState::Running { output, progress } = &mut self.state else {
            return false;
        };
        *progress = RunProgress::from(&status);
        self.last_progress = Some(*progress);
        debug!("Run progress {}", progress);

        if status.is_finished() {
            let output = std::mem::take(output);
            self.ticker.cancel();
            self.transition(RunState::Completed { output });
        }
        true
    }

    /// Poll the server if a poll is due
    pub fn poll(&mut self, api: &dyn SimulationApi, now: Instant) -> bool {
        match self.poll_ticket(now) {
            Some(ticket) => {
                let response = api.run_status();
                self.handle_poll(ticket, response)
            }
            None => false,
        }
    }

    /// Cancel the run
    ///
    /// Polling halts before the server is contacted. A failed stop request is
    /// reported and can be retried from `Stopped`.
    pub fn stop(&mut self, api: &dyn SimulationApi) -> Result<(), RunError> {
        match self.state {
            RunState::Running { .. } => {
                self.ticker.cancel();
                self.transition(RunState::Stopped);
            }
            RunState::Stopped => info!("Retrying stop request"),
            _ => return Err(self.invalid("stop")),
        }
        api.stop_run().map_err(RunError::from)
    }

    /// Return to idle after a finished run
    pub fn reset(&mut self) -> Result<(), RunError> {
        if !self.state.is_terminal() {
            return Err(self.invalid("reset"));
        }
        self.transition(RunState::Idle);
        Ok(())
    }
}
