//! Starter network generation.

use super::ScenarioError;
use crate::ip::{next_address, IpError, Subnet};
use crate::topology::document::GraphSnapshot;
use crate::topology::types::{Node, NodeDefaults, Protocol, SlaveDevice};
use std::net::Ipv4Addr;

/// Build an unconnected network of `masters` masters and `slaves` slaves
///
/// Masters are named `master_0..`, slaves `slave_0..`. Addresses are handed
/// out in order starting two above the network address, masters first.
///
/// # Arguments
/// * `protocol` - Protocol of the scenario
/// * `subnet` - Address range of the scenario
/// * `masters` - Number of master devices, at least 1
/// * `slaves` - Number of slave devices, at least 1
/// * `defaults` - Port and slave id given to every slave
///
/// # Returns
/// * The generated graph, or an error when the subnet is too small
pub fn generate_network(
    protocol: Protocol,
    subnet: Subnet,
    masters: u32,
    slaves: u32,
    defaults: &NodeDefaults,
) -> Result<GraphSnapshot, ScenarioError> {
    if masters == 0 || slaves == 0 {
        return Err(ScenarioError::EmptyNetwork);
    }

    let mut ip = next_address(subnet.network_address(), &subnet)?;
    let mut take_ip = || -> Result<Ipv4Addr, ScenarioError> {
        ip = next_address(ip, &subnet)?;
        if !subnet.contains(ip) || ip == subnet.network_address() {
            return Err(IpError::SubnetExhausted(subnet).into());
        }
        Ok(ip)
    };

    let mut nodes = Vec::with_capacity((masters + slaves) as usize);
    for i in 0..masters {
        let name = format!("master_{}", i);
        nodes.push(Node::master(name.clone(), name).with_ip(take_ip()?.to_string()));
    }
    for i in 0..slaves {
        let name = format!("slave_{}", i);
        let device = SlaveDevice::new(defaults.port, defaults.slave_id);
        nodes.push(Node::slave(name.clone(), name, device).with_ip(take_ip()?.to_string()));
    }

    log::info!("Generated {} masters and {} slaves in {}", masters, slaves, subnet);
    Ok(GraphSnapshot {
        ip_network: subnet,
        protocol,
        nodes,
        edges: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_names_and_addresses() {
        let snapshot = generate_network(
            Protocol::Modbus,
            "192.168.0.0/24".parse().unwrap(),
            1,
            2,
            &NodeDefaults::default(),
        )
        .unwrap();

        let summary: Vec<(&str, &str)> = snapshot.nodes.iter().map(|n| (n.id.as_str(), n.ip.as_str())).collect();
        assert_eq!(
            summary,
            vec![("master_0", "192.168.0.2"), ("slave_0", "192.168.0.3"), ("slave_1", "192.168.0.4")]
        );
        assert!(snapshot.nodes[0].slave.is_none());
        assert_eq!(snapshot.nodes[2].slave.as_ref().unwrap().port, 502);
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn test_generate_rejects_empty_and_overflow() {
        let subnet: Subnet = "10.0.0.0/30".parse().unwrap();
        assert!(matches!(
            generate_network(Protocol::Modbus, subnet, 0, 1, &NodeDefaults::default()),
            Err(ScenarioError::EmptyNetwork)
        ));
        assert!(generate_network(Protocol::Modbus, subnet, 1, 1, &NodeDefaults::default()).is_ok());
        assert!(matches!(
            generate_network(Protocol::Modbus, subnet, 2, 1, &NodeDefaults::default()),
            Err(ScenarioError::Ip(_))
        ));
    }
}
