//! Message schedule editing.
//!
//! An edge carries an ordered list of [`Message`]s. Forms submit each row as
//! raw text; this module turns rows into typed messages and checks typed
//! messages against the per-function-code field rules.

use crate::topology::types::{FunctionCode, Message};
use crate::utils::field::FieldError;
use serde::{Deserialize, Serialize};

/// One schedule row exactly as entered
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMessage {
    pub timestamp: String,
    pub recurrent: bool,
    pub interval: String,
    pub function_code: String,
    pub start_address: String,
    pub count: String,
    pub values: String,
}

impl From<&Message> for RawMessage {
    fn from(message: &Message) -> Self {
        Self {
            timestamp: message.timestamp.to_string(),
            recurrent: message.recurrent,
            interval: message.interval.map(|i| i.to_string()).unwrap_or_default(),
            function_code: message.function_code.to_string(),
            start_address: message
                .start_address
                .map(|a| format!("0x{:04X}", a))
                .unwrap_or_default(),
            count: message.count.map(|c| c.to_string()).unwrap_or_default(),
            values: message
                .values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

fn field_error(field: &str, raw: &str) -> FieldError {
    FieldError::InvalidMessageField(format!("{} '{}'", field, raw))
}

/// Parse a register address given in decimal or `0x` hexadecimal
pub fn parse_address(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => raw.parse::<u16>().ok(),
    }
}

fn parse_values(raw: &str) -> Option<Vec<u16>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(Vec::new());
    }
    raw.split(',').map(|v| v.trim().parse::<u16>().ok()).collect()
}

/// Parse one schedule row into a normalised message
///
/// Fields the function code does not use are dropped rather than rejected:
/// the address for code 43, the count for write codes, the values for read
/// codes, and the interval of a one-shot message.
///
/// # Examples
/// ```
/// use icsnet::schedule::{parse_row, RawMessage};
///
/// let row = RawMessage {
///     timestamp: "0".into(),
///     function_code: "43".into(),
///     ..Default::default()
/// };
/// assert!(parse_row(&row).is_ok());
/// ```
pub fn parse_row(raw: &RawMessage) -> Result<Message, FieldError> {
    let timestamp = raw
        .timestamp
        .trim()
        .parse::<u64>()
        .map_err(|_| field_error("timestamp", &raw.timestamp))?;

    let function_code = raw
        .function_code
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(|code| FunctionCode::try_from(code).ok())
        .ok_or_else(|| field_error("function code", &raw.function_code))?;

    let mut message = Message::new(timestamp, function_code);
    message.recurrent = raw.recurrent;

    if raw.recurrent {
        let interval = raw
            .interval
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|i| *i > 0)
            .ok_or_else(|| field_error("interval", &raw.interval))?;
        message.interval = Some(interval);
    }

    if function_code.uses_address() && !raw.start_address.trim().is_empty() {
        let address = parse_address(&raw.start_address).ok_or_else(|| field_error("start address", &raw.start_address))?;
        message.start_address = Some(address);
    }

    if function_code.is_read() {
        let count = raw
            .count
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| field_error("count", &raw.count))?;
        message.count = Some(count);
    }

    if function_code.is_write() {
        message.values = parse_values(&raw.values)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| field_error("values", &raw.values))?;
    }

    Ok(message)
}

/// Parse every row of a schedule form
///
/// All rows are checked; the error lists every invalid 1-based row number.
pub fn parse_rows(rows: &[RawMessage]) -> Result<Vec<Message>, FieldError> {
    let mut messages = Vec::with_capacity(rows.len());
    let mut invalid = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match parse_row(row) {
            Ok(message) => messages.push(message),
            Err(e) => {
                log::debug!("Schedule row {} rejected: {}", index + 1, e);
                invalid.push(index + 1);
            }
        }
    }

    if invalid.is_empty() {
        Ok(messages)
    } else {
        Err(FieldError::InvalidMessageRows(invalid))
    }
}

/// Check a typed message against the field rules of its function code
pub fn validate_message(message: &Message) -> bool {
    if message.recurrent != message.interval.is_some() || message.interval == Some(0) {
        return false;
    }

    let fc = message.function_code;
    if !fc.uses_address() && message.start_address.is_some() {
        return false;
    }
    if fc.is_read() && !matches!(message.count, Some(c) if c > 0) {
        return false;
    }
    if fc.is_write() && message.values.is_empty() {
        return false;
    }
    true
}
