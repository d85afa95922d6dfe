use serde::Serialize;

use crate::packet::{Packet, Protocol};

/// Running tallies over accepted packets. Zeroed at startup, never reset
/// within a run.
#[derive(Debug, Default)]
pub struct Counters {
    tcp: u64,
    udp: u64,
    icmp: u64,
    total_bytes: u64,
}

/// Point-in-time copy of the counters, safe to hold outside the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub tcp: u64,
    pub udp: u64,
    pub icmp: u64,
    pub total_bytes: u64,
}

impl Counters {
    /// Records one accepted packet: bumps the matching protocol counter
    /// (unknown protocols bump none) and always adds the packet size to
    /// the byte total.
    pub fn record(&mut self, packet: &Packet) {
        match packet.protocol {
            Protocol::Tcp => self.tcp += 1,
            Protocol::Udp => self.udp += 1,
            Protocol::Icmp => self.icmp += 1,
            Protocol::Unknown(_) => {}
        }
        self.total_bytes += packet.size as u64;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tcp: self.tcp,
            udp: self.udp,
            icmp: self.icmp,
            total_bytes: self.total_bytes,
        }
    }
}

impl StatsSnapshot {
    /// Fixed-format report: TCP, UDP, ICMP, then total bytes.
    pub fn report(&self) -> String {
        format!(
            "TCP packets: {}\nUDP packets: {}\nICMP packets: {}\nTotal bytes: {}",
            self.tcp, self.udp, self.icmp, self.total_bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(protocol_byte: u8, size: usize) -> Packet {
        let mut buf = vec![0u8; size.max(11)];
        buf[10] = protocol_byte;
        Packet::parse(&buf[..size]).unwrap()
    }

    #[test]
    fn counts_per_protocol_and_total_bytes() {
        let mut counters = Counters::default();
        counters.record(&packet(6, 11));
        counters.record(&packet(17, 20));
        assert_eq!(
            counters.snapshot(),
            StatsSnapshot {
                tcp: 1,
                udp: 1,
                icmp: 0,
                total_bytes: 31
            }
        );
    }

    #[test]
    fn unknown_protocol_still_counts_bytes() {
        let mut counters = Counters::default();
        counters.record(&packet(0x2f, 64));
        let snap = counters.snapshot();
        assert_eq!((snap.tcp, snap.udp, snap.icmp), (0, 0, 0));
        assert_eq!(snap.total_bytes, 64);
    }

    #[test]
    fn recording_is_order_insensitive() {
        let packets = [packet(6, 11), packet(1, 30), packet(6, 12), packet(17, 20)];

        let mut forward = Counters::default();
        for p in &packets {
            forward.record(p);
        }
        let mut reverse = Counters::default();
        for p in packets.iter().rev() {
            reverse.record(p);
        }
        assert_eq!(forward.snapshot(), reverse.snapshot());
    }

    #[test]
    fn report_format_is_fixed() {
        let mut counters = Counters::default();
        counters.record(&packet(1, 15));
        assert_eq!(
            counters.snapshot().report(),
            "TCP packets: 0\nUDP packets: 0\nICMP packets: 1\nTotal bytes: 15"
        );
    }
}
