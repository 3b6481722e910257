//! Struct and implementation of the Node entry in the Kademlia routing table
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::common::Id;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// A peer as known by the routing table: its [Id] and where to reach it.
pub struct Node {
    id: Id,
    ip: IpAddr,
    tcp_port: u16,
    udp_port: u16,
}

impl Node {
    /// Creates a new Node from an id, ip address, and its tcp and udp ports.
    pub fn new(id: Id, ip: IpAddr, tcp_port: u16, udp_port: u16) -> Node {
        Node {
            id,
            ip,
            tcp_port,
            udp_port,
        }
    }

    /// Creates a node with random Id for testing purposes.
    pub fn random() -> Node {
        Node::new(Id::random(), Ipv4Addr::LOCALHOST.into(), 0, 0)
    }

    // === Getters ===

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }

    pub fn udp_port(&self) -> u16 {
        self.udp_port
    }

    /// Address to send discovery packets (ping, find_node) to.
    pub fn udp_address(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.udp_port)
    }

    /// Address to open a stream connection to.
    pub fn tcp_address(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.tcp_port)
    }

    /// Returns `true` if both nodes advertise the same ip and ports.
    pub fn same_address(&self, other: &Node) -> bool {
        self.ip == other.ip && self.tcp_port == other.tcp_port && self.udp_port == other.udp_port
    }
}
