//! Field-level input errors and the last-good-value fallback.
//!
//! Form collaborators hand the core raw text. When that text does not parse,
//! the core keeps the previous value and reports a notice instead of failing
//! the whole edit.

/// An input that could not be applied to a single field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Invalid IP address '{0}'")]
    InvalidIp(String),
    #[error("No free address left in subnet {0}")]
    AddressExhausted(String),
    #[error("Invalid MAC address '{0}'")]
    InvalidMac(String),
    #[error("Invalid register values format '{0}'")]
    InvalidRegisterFormat(String),
    #[error("Register key cannot be less than or equal to 0")]
    RegisterKeyNotPositive,
    #[error("Invalid message field: {0}")]
    InvalidMessageField(String),
    #[error("{}", describe_rows(.0))]
    InvalidMessageRows(Vec<usize>),
}

fn describe_rows(rows: &[usize]) -> String {
    match rows {
        [row] => format!("Invalid message fields in row {}", row),
        _ => format!(
            "Invalid message fields in rows {}",
            rows.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Result of applying raw input to a field.
///
/// `value` is always usable: either the freshly parsed value or the previous
/// one when `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutcome<T> {
    pub value: T,
    pub error: Option<FieldError>,
}

impl<T> FieldOutcome<T> {
    pub fn accepted(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn kept(previous: T, error: FieldError) -> Self {
        log::warn!("{}; keeping previous value", error);
        Self { value: previous, error: Some(error) }
    }

    pub fn is_accepted(&self) -> bool {
        self.error.is_none()
    }

    /// Split into the value and the optional notice.
    pub fn into_parts(self) -> (T, Option<FieldError>) {
        (self.value, self.error)
    }
}
