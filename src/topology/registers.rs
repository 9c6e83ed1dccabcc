//! Register bank text parsing.
//!
//! Forms edit a bank as text: `0,1,0,1` for sequential banks and
//! `1:10,2:20` for sparse ones.

use super::types::{RegisterBank, RegisterKind};
use crate::utils::field::{FieldError, FieldOutcome};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SEQUENTIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9\s,]*$").expect("valid sequential pattern"));
static SPARSE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9:\s,]*$").expect("valid sparse pattern"));

/// Parse the textual form of a register bank
///
/// Blank text yields an empty bank of the requested kind. Sparse addresses
/// must be at least 1.
///
/// # Examples
/// ```
/// use icsnet::topology::registers::parse_bank;
/// use icsnet::topology::{RegisterBank, RegisterKind};
///
/// assert_eq!(parse_bank(RegisterKind::Sequential, "0, 1, 1").unwrap(), RegisterBank::Sequential(vec![0, 1, 1]));
/// assert!(parse_bank(RegisterKind::Sparse, "0:5").is_err());
/// ```
pub fn parse_bank(kind: RegisterKind, text: &str) -> Result<RegisterBank, FieldError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(RegisterBank::empty(kind));
    }

    let format_error = || FieldError::InvalidRegisterFormat(text.to_string());

    match kind {
        RegisterKind::Sequential => {
            if !SEQUENTIAL_CHARS.is_match(text) {
                return Err(format_error());
            }
            let values = text
                .split(',')
                .map(|v| v.trim().parse::<u16>().map_err(|_| format_error()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RegisterBank::Sequential(values))
        }
        RegisterKind::Sparse => {
            if !SPARSE_CHARS.is_match(text) {
                return Err(format_error());
            }
            let mut values = BTreeMap::new();
            for pair in text.split(',') {
                let (address, value) = pair.split_once(':').ok_or_else(format_error)?;
                let address = address.trim().parse::<u16>().map_err(|_| format_error())?;
                let value = value.trim().parse::<u16>().map_err(|_| format_error())?;
                if address < 1 {
                    return Err(FieldError::RegisterKeyNotPositive);
                }
                values.insert(address, value);
            }
            Ok(RegisterBank::Sparse(values))
        }
    }
}

/// Render a bank in the textual form accepted by [`parse_bank`]
pub fn format_bank(bank: &RegisterBank) -> String {
    match bank {
        RegisterBank::Sequential(values) => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(","),
        RegisterBank::Sparse(values) => values
            .iter()
            .map(|(address, value)| format!("{}:{}", address, value))
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Apply form input to a bank, keeping `previous` (kind included) on error
pub fn assign_bank(kind: RegisterKind, text: &str, previous: &RegisterBank) -> FieldOutcome<RegisterBank> {
    match parse_bank(kind, text) {
        Ok(bank) => FieldOutcome::accepted(bank),
        Err(e) => FieldOutcome::kept(previous.clone(), e),
    }
}
