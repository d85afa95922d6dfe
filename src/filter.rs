use std::net::Ipv4Addr;

use crate::error::ConfigError;
use crate::packet::Packet;

/// Current match constraints. Unset fields are wildcards: `None` for the
/// IP, `0` for the port, empty string for the protocol name.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub ip: Option<Ipv4Addr>,
    pub port: u16,
    pub protocol: String,
}

impl FilterCriteria {
    /// Replaces the criteria from raw console/CLI input. On any invalid
    /// field the previous criteria are left untouched.
    pub fn set(&mut self, ip_raw: &str, port_raw: &str, proto_raw: &str) -> Result<(), ConfigError> {
        let ip = match ip_raw.trim() {
            "" => None,
            s => Some(
                s.parse::<Ipv4Addr>()
                    .map_err(|_| ConfigError::InvalidIp(s.to_string()))?,
            ),
        };
        let port = match port_raw.trim() {
            "" => 0,
            s => s
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(s.to_string()))?,
        };

        self.ip = ip;
        self.port = port;
        // Protocol names are matched against the packet's display form.
        self.protocol = proto_raw.trim().to_uppercase();
        Ok(())
    }

    /// True only if every set criterion matches the packet exactly.
    pub fn matches(&self, packet: &Packet) -> bool {
        if let Some(ip) = self.ip {
            if packet.source_ip != ip {
                return false;
            }
        }
        if self.port != 0 && packet.port != self.port {
            return false;
        }
        if !self.protocol.is_empty()
            && !packet.protocol.to_string().eq_ignore_ascii_case(&self.protocol)
        {
            return false;
        }
        true
    }
}
