//! IPv4 subnet (CIDR) type.
//!
//! A scenario's devices all live in one subnet. This file parses and prints
//! the `a.b.c.d/len` notation and answers membership questions.

use super::IpError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 network expressed as base address and prefix length
///
/// Host bits in the base address are cleared on construction, so
/// `10.0.0.7/24` and `10.0.0.0/24` denote the same subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subnet {
    network: Ipv4Addr,
    prefix: u8,
}

impl Subnet {
    pub fn new(address: Ipv4Addr, prefix: u8) -> Result<Self, IpError> {
        if prefix > 32 {
            return Err(IpError::InvalidSubnet(format!("{}/{}", address, prefix)));
        }
        let network = Ipv4Addr::from(u32::from(address) & Self::mask_for(prefix));
        Ok(Self { network, prefix })
    }

    fn mask_for(prefix: u8) -> u32 {
        if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - prefix as u32)
        }
    }

    /// The first address of the subnet
    pub fn network_address(&self) -> Ipv4Addr {
        self.network
    }

    /// The last address of the subnet
    pub fn broadcast_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !Self::mask_for(self.prefix))
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix
    }

    /// Total number of addresses covered, network and broadcast included
    pub fn address_count(&self) -> u64 {
        1u64 << (32 - self.prefix as u32)
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & Self::mask_for(self.prefix) == u32::from(self.network)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Subnet {
    type Err = IpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| IpError::InvalidSubnet(s.to_string()))?;
        let address = addr
            .parse::<Ipv4Addr>()
            .map_err(|_| IpError::InvalidAddress(addr.to_string()))?;
        let prefix = prefix
            .parse::<u8>()
            .map_err(|_| IpError::InvalidSubnet(s.to_string()))?;
        Subnet::new(address, prefix)
    }
}

impl TryFrom<String> for Subnet {
    type Error = IpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subnet> for String {
    fn from(subnet: Subnet) -> Self {
        subnet.to_string()
    }
}
