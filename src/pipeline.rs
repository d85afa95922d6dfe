use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::capture::{PacketSource, BUFFER_CAPACITY};
use crate::error::CaptureError;
use crate::filter::FilterCriteria;
use crate::packet::Packet;
use crate::stats::Counters;

/// State shared between the capture loop and the console: the filter
/// criteria, the counters, and the shutdown flag. These are the only
/// values crossing that thread boundary.
#[derive(Clone, Default)]
pub struct Shared {
    pub filter: Arc<Mutex<FilterCriteria>>,
    pub counters: Arc<Mutex<Counters>>,
    pub running: Arc<AtomicBool>,
}

impl Shared {
    pub fn new() -> Self {
        let shared = Shared::default();
        shared.running.store(true, Ordering::SeqCst);
        shared
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// The capture loop: receive one packet, parse it, test it against the
/// current filter, print and record it if accepted, repeat. Each packet
/// is fully processed before the next receive. Returns `Ok(())` on a
/// clean shutdown and the receive error if the socket fails.
pub fn run_pipeline<S: PacketSource>(mut source: S, shared: &Shared) -> Result<(), CaptureError> {
    let mut buf = [0u8; BUFFER_CAPACITY];

    while shared.is_running() {
        let n = match source.next_packet(&mut buf) {
            Ok(Some(n)) => n,
            // Receive timeout; loop around and re-check the flag.
            Ok(None) => continue,
            Err(e) => {
                error!("capture loop failed: {}", e);
                shared.shutdown();
                return Err(e);
            }
        };

        let packet = match Packet::parse(&buf[..n]) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("skipping packet: {}", e);
                continue;
            }
        };

        let accepted = shared.filter.lock().matches(&packet);
        if accepted {
            println!("{}", packet.summary());
            shared.counters.lock().record(&packet);
        }
    }

    info!("capture loop stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Feeds a fixed script of receive results to the pipeline, then
    /// clears the running flag.
    struct ScriptedSource {
        script: Vec<Result<Option<Vec<u8>>, CaptureError>>,
        shared: Shared,
    }

    impl PacketSource for ScriptedSource {
        fn next_packet(&mut self, buf: &mut [u8]) -> Result<Option<usize>, CaptureError> {
            if self.script.is_empty() {
                self.shared.shutdown();
                return Ok(None);
            }
            match self.script.remove(0) {
                Ok(Some(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(Some(data.len()))
                }
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            }
        }
    }

    fn raw_packet(protocol_byte: u8, size: usize) -> Vec<u8> {
        let mut data = vec![0u8; size];
        data[..8].copy_from_slice(&[192, 168, 1, 1, 10, 0, 0, 1]);
        data[8..10].copy_from_slice(&8080u16.to_be_bytes());
        data[10] = protocol_byte;
        data
    }

    #[test]
    fn accepted_packets_are_recorded() {
        let shared = Shared::new();
        let source = ScriptedSource {
            script: vec![Ok(Some(raw_packet(6, 11))), Ok(None), Ok(Some(raw_packet(17, 20)))],
            shared: shared.clone(),
        };

        run_pipeline(source, &shared).unwrap();

        let snap = shared.counters.lock().snapshot();
        assert_eq!((snap.tcp, snap.udp, snap.icmp), (1, 1, 0));
        assert_eq!(snap.total_bytes, 31);
    }

    #[test]
    fn short_packet_is_skipped_and_loop_continues() {
        let shared = Shared::new();
        let source = ScriptedSource {
            script: vec![Ok(Some(vec![0u8; 5])), Ok(Some(raw_packet(6, 11)))],
            shared: shared.clone(),
        };

        run_pipeline(source, &shared).unwrap();

        // The 5-byte datagram left the counters untouched; the TCP packet
        // after it was still processed.
        let snap = shared.counters.lock().snapshot();
        assert_eq!(snap.tcp, 1);
        assert_eq!(snap.total_bytes, 11);
    }

    #[test]
    fn filtered_out_packets_are_not_recorded() {
        let shared = Shared::new();
        shared.filter.lock().set("10.0.0.1", "", "").unwrap();
        let source = ScriptedSource {
            script: vec![Ok(Some(raw_packet(6, 11)))],
            shared: shared.clone(),
        };

        run_pipeline(source, &shared).unwrap();
        assert_eq!(shared.counters.lock().snapshot().total_bytes, 0);
    }

    #[test]
    fn receive_error_is_fatal() {
        let shared = Shared::new();
        let source = ScriptedSource {
            script: vec![
                Ok(Some(raw_packet(6, 11))),
                Err(CaptureError::RecvFailed(io::Error::new(
                    io::ErrorKind::Other,
                    "socket closed",
                ))),
            ],
            shared: shared.clone(),
        };

        let result = run_pipeline(source, &shared);
        assert!(matches!(result, Err(CaptureError::RecvFailed(_))));
        assert!(!shared.is_running());
        // The packet before the failure was still counted.
        assert_eq!(shared.counters.lock().snapshot().tcp, 1);
    }
}
