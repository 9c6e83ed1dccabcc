//! Blocking driver for a simulation run.

use super::controller::{RunController, RunState};
use super::progress::RunProgress;
use super::RunError;
use crate::api::SimulationApi;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest single sleep, so a cancel request is noticed promptly
const CANCEL_CHECK: Duration = Duration::from_millis(100);

/// Start `scenario` and poll until it completes or `cancel` is raised
///
/// `on_progress` sees every accepted status update. Returns the terminal
/// state the run ended in.
pub fn run_to_completion<F>(
    api: &dyn SimulationApi,
    scenario: &str,
    duration: &str,
    poll_interval: Duration,
    cancel: &AtomicBool,
    mut on_progress: F,
) -> Result<RunState, RunError>
where
    F: FnMut(&RunProgress),
{
    let mut controller = RunController::new(poll_interval);
    controller.open_settings()?;
    controller.submit(duration)?;
    controller.start(api, scenario, Instant::now())?;

    while controller.state().is_running() {
        if cancel.load(Ordering::SeqCst) {
            log::info!("Cancellation requested");
            controller.stop(api)?;
            break;
        }

        let now = Instant::now();
        if controller.poll(api, now) {
            if let Some(progress) = controller.last_progress() {
                on_progress(&progress);
            }
            continue;
        }

        if let Some(due) = controller.next_poll() {
            thread::sleep(due.saturating_duration_since(now).min(CANCEL_CHECK));
        }
    }

    Ok(controller.state().clone())
}
