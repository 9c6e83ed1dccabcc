//! MAC address normalisation.

use super::field::{FieldError, FieldOutcome};
use regex::Regex;
use std::sync::LazyLock;

/// Accepts colon, dash or dot separated groups, or bare hex digits.
static MAC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9A-Fa-f]{2}(?:[:-]?|\.?)){5}[0-9A-Fa-f]{2}$").expect("valid MAC pattern")
});

/// Check whether a string is a MAC address in any supported notation
pub fn is_valid_mac(candidate: &str) -> bool {
    MAC_PATTERN.is_match(candidate)
}

/// Convert a MAC address to the canonical `AA:BB:CC:DD:EE:FF` form
///
/// # Examples
/// ```
/// use icsnet::utils::mac::normalize_mac;
///
/// assert_eq!(normalize_mac("aa-bb-cc-dd-ee-ff").unwrap(), "AA:BB:CC:DD:EE:FF");
/// assert_eq!(normalize_mac("aabb.ccdd.eeff").unwrap(), "AA:BB:CC:DD:EE:FF");
/// assert!(normalize_mac("zz:bb:cc:dd:ee:ff").is_err());
/// ```
pub fn normalize_mac(candidate: &str) -> Result<String, FieldError> {
    let candidate = candidate.trim();
    if !is_valid_mac(candidate) {
        return Err(FieldError::InvalidMac(candidate.to_string()));
    }

    let hex: String = candidate.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() != 12 {
        return Err(FieldError::InvalidMac(candidate.to_string()));
    }

    let octets: Vec<String> = hex
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).to_ascii_uppercase())
        .collect();
    Ok(octets.join(":"))
}

/// Apply form input to a MAC field.
///
/// Blank input clears the address; malformed input keeps `previous`.
pub fn assign_mac(candidate: &str, previous: &str) -> FieldOutcome<String> {
    if candidate.trim().is_empty() {
        return FieldOutcome::accepted(String::new());
    }
    match normalize_mac(candidate) {
        Ok(mac) => FieldOutcome::accepted(mac),
        Err(e) => FieldOutcome::kept(previous.to_string(), e),
    }
}
