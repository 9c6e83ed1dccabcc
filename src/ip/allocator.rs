//! IP address allocation logic.
//!
//! Addresses are handed out by walking the subnet as a big-endian counter:
//! the lowest octet below 255 is incremented and octets at 255 roll over to 0,
//! carrying into the next higher octet.

use super::{IpError, Subnet};
use crate::utils::field::{FieldError, FieldOutcome};
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// Return the address following `ip`
///
/// The increment itself is not bounded by the subnet: stepping past the
/// broadcast address leaves the subnet, and `255.255.255.255` wraps to
/// `0.0.0.0`. Only the input is checked for membership.
///
/// # Examples
/// ```
/// use icsnet::ip::{next_address, Subnet};
/// use std::net::Ipv4Addr;
///
/// let subnet: Subnet = "10.0.0.0/16".parse().unwrap();
/// assert_eq!(next_address(Ipv4Addr::new(10, 0, 0, 1), &subnet).unwrap(), Ipv4Addr::new(10, 0, 0, 2));
/// assert_eq!(next_address(Ipv4Addr::new(10, 0, 0, 255), &subnet).unwrap(), Ipv4Addr::new(10, 0, 1, 0));
/// ```
pub fn next_address(ip: Ipv4Addr, subnet: &Subnet) -> Result<Ipv4Addr, IpError> {
    if !subnet.contains(ip) {
        return Err(IpError::NotInSubnet { ip, subnet: *subnet });
    }

    let mut octets = ip.octets();
    for octet in octets.iter_mut().rev() {
        if *octet < 255 {
            *octet += 1;
            break;
        }
        *octet = 0;
    }

    Ok(Ipv4Addr::from(octets))
}

/// Find the first address after the network address that is not in `existing`
///
/// The walk stops once it leaves the subnet, so a fully occupied subnet
/// yields `SubnetExhausted` instead of looping.
pub fn first_unused(existing: &HashSet<Ipv4Addr>, subnet: &Subnet) -> Result<Ipv4Addr, IpError> {
    let mut candidate = subnet.network_address();

    // One step per address in the subnet at most.
    for _ in 0..subnet.address_count() {
        candidate = match next_address(candidate, subnet) {
            Ok(next) => next,
            Err(IpError::NotInSubnet { .. }) => break,
            Err(e) => return Err(e),
        };
        if !subnet.contains(candidate) || candidate == subnet.network_address() {
            break;
        }
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(IpError::SubnetExhausted(*subnet))
}

/// Address reserved for the simulated network's gateway (network + 1)
pub fn gateway_address(subnet: &Subnet) -> Option<Ipv4Addr> {
    first_unused(&HashSet::new(), subnet).ok()
}

/// Collect the parseable addresses out of a list of node IP strings
pub fn collect_addresses<'a, I>(ips: I) -> HashSet<Ipv4Addr>
where
    I: IntoIterator<Item = &'a str>,
{
    ips.into_iter()
        .filter_map(|ip| ip.trim().parse::<Ipv4Addr>().ok())
        .collect()
}

/// Apply form input to a node's IP field
///
/// - blank input: the first unused address of the subnet, never the gateway
/// - a syntactically valid address: taken verbatim (uniqueness is checked
///   at save time)
/// - anything else: `previous` is kept and the error is reported
pub fn assign(
    candidate: &str,
    previous: &str,
    subnet: &Subnet,
    existing: &HashSet<Ipv4Addr>,
) -> FieldOutcome<String> {
    let candidate = candidate.trim();

    if candidate.is_empty() {
        let mut taken = existing.clone();
        taken.extend(gateway_address(subnet));
        return match first_unused(&taken, subnet) {
            Ok(ip) => {
                log::debug!("Assigned free address {} from {}", ip, subnet);
                FieldOutcome::accepted(ip.to_string())
            }
            Err(_) => FieldOutcome::kept(
                previous.to_string(),
                FieldError::AddressExhausted(subnet.to_string()),
            ),
        };
    }

    match candidate.parse::<Ipv4Addr>() {
        Ok(ip) => FieldOutcome::accepted(ip.to_string()),
        Err(_) => FieldOutcome::kept(previous.to_string(), FieldError::InvalidIp(candidate.to_string())),
    }
}
