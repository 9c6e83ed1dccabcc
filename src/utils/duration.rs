//! Duration parsing and formatting utilities.
//!
//! This module parses the simulation time entered by the operator and formats
//! elapsed/total seconds for run progress displays.

use chrono::TimeDelta;

/// Parse a simulation time (whole seconds) entered as text
///
/// Only a positive integer is accepted; units, signs and fractions are
/// rejected so the request body always carries a plain second count.
///
/// # Examples
/// ```
/// use icsnet::utils::duration::parse_simulation_time;
///
/// assert_eq!(parse_simulation_time("30"), Ok(30));
/// assert_eq!(parse_simulation_time(" 600 "), Ok(600));
/// assert!(parse_simulation_time("0").is_err());
/// assert!(parse_simulation_time("1.5").is_err());
/// assert!(parse_simulation_time("").is_err());
/// ```
pub fn parse_simulation_time(input: &str) -> Result<u64, String> {
    let input = input.trim();

    if input.is_empty() {
        return Err("A simulation time must be provided".to_string());
    }

    if !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("Simulation time must be a whole number of seconds: {}", input));
    }

    match input.parse::<u64>() {
        Ok(0) => Err("Simulation time must be greater than 0".to_string()),
        Ok(seconds) => Ok(seconds),
        Err(_) => Err(format!("Simulation time is out of range: {}", input)),
    }
}

/// Format a second count as a `hh:mm:ss` clock
///
/// Hours keep counting past 24, so long runs read as `25:00:00`.
pub fn format_clock(seconds: u64) -> String {
    let span = i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX);
    format!(
        "{:02}:{:02}:{:02}",
        span.num_hours(),
        span.num_minutes() % 60,
        span.num_seconds() % 60
    )
}
