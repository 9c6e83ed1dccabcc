//! Shared utilities: field fallbacks, MAC normalisation, duration helpers.

pub mod duration;
pub mod field;
pub mod mac;

pub use duration::{format_clock, parse_simulation_time};
pub use field::{FieldError, FieldOutcome};
pub use mac::{assign_mac, normalize_mac};
