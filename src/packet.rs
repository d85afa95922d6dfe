use std::fmt;
use std::net::Ipv4Addr;

use crate::error::ParseError;

/// Smallest buffer a packet can be parsed from: two IPv4 addresses,
/// a port and a protocol byte.
pub const MIN_PACKET_LEN: usize = 11;

/// Transport protocol resolved from the IP protocol-number byte.
/// Unrecognized numbers are kept verbatim so they can still be
/// displayed and filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Icmp,
    Tcp,
    Udp,
    Unknown(u8),
}

impl Protocol {
    pub fn from_byte(b: u8) -> Self {
        match b {
            1 => Protocol::Icmp,
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            other => Protocol::Unknown(other),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Icmp => write!(f, "ICMP"),
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
            Protocol::Unknown(b) => write!(f, "{:02x}", b),
        }
    }
}

/// One parsed packet. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub source_ip: Ipv4Addr,
    pub dest_ip: Ipv4Addr,
    pub port: u16,
    pub protocol: Protocol,
    pub size: usize,
}

impl Packet {
    /// Parses the valid prefix of a receive buffer. Fixed offsets:
    /// bytes 0..4 source IP, 4..8 destination IP, 8..10 port
    /// (big-endian, network byte order), byte 10 protocol number.
    /// `size` is the number of bytes received, not the buffer capacity.
    pub fn parse(buf: &[u8]) -> Result<Packet, ParseError> {
        if buf.len() < MIN_PACKET_LEN {
            return Err(ParseError::TooShort { len: buf.len() });
        }

        Ok(Packet {
            source_ip: Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3]),
            dest_ip: Ipv4Addr::new(buf[4], buf[5], buf[6], buf[7]),
            port: u16::from_be_bytes([buf[8], buf[9]]),
            protocol: Protocol::from_byte(buf[10]),
            size: buf.len(),
        })
    }

    /// The five-line summary printed for every accepted packet.
    pub fn summary(&self) -> String {
        format!(
            "Source IP: {}\nDestination IP: {}\nPort: {}\nProtocol: {}\nSize: {}",
            self.source_ip, self.dest_ip, self.port, self.protocol, self.size
        )
    }
}
