//! IP address allocation and management module.
//!
//! This module handles subnet parsing and address assignment for devices
//! placed in the editor.

pub mod allocator;
pub mod subnet;

use std::net::Ipv4Addr;

// Re-export commonly used types
pub use allocator::{assign, collect_addresses, first_unused, gateway_address, next_address};
pub use subnet::Subnet;

/// Address arithmetic errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IpError {
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),
    #[error("Invalid IP network: {0}")]
    InvalidSubnet(String),
    #[error("IP {ip} does not belong to subnet {subnet}")]
    NotInSubnet { ip: Ipv4Addr, subnet: Subnet },
    #[error("No free address left in subnet {0}")]
    SubnetExhausted(Subnet),
}
