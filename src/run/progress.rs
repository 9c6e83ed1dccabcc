//! Run progress display values.

use crate::api::types::RunStatus;
use crate::utils::duration::format_clock;
use std::fmt;

/// Progress of a running simulation as last reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunProgress {
    pub elapsed: u64,
    pub total: u64,
    /// Capture size in bytes
    pub output_size: u64,
}

impl RunProgress {
    /// Progress before the first status arrives
    pub fn started(total: u64) -> Self {
        Self { elapsed: 0, total, output_size: 0 }
    }

    /// Completion percentage, capped at 100
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.elapsed as f64 / self.total as f64 * 100.0).min(100.0)
    }

    /// `hh:mm:ss / hh:mm:ss`
    pub fn clock(&self) -> String {
        format!("{} / {}", format_clock(self.elapsed), format_clock(self.total))
    }
}

impl From<&RunStatus> for RunProgress {
    fn from(status: &RunStatus) -> Self {
        Self {
            elapsed: status.elapsed_seconds,
            total: status.total_seconds,
            output_size: status.pcap_size,
        }
    }
}

impl fmt::Display for RunProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}%) {}", self.clock(), self.percent(), format_size(self.output_size))
    }
}

/// Human readable byte count
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
