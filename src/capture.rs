use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::info;

use crate::error::CaptureError;

/// Receive buffer capacity; datagrams longer than this are truncated by
/// the socket.
pub const BUFFER_CAPACITY: usize = 1024;

/// How long a receive blocks before waking to let the driver check the
/// shutdown flag.
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

/// Anything the pipeline can pull raw packets from. `Ok(Some(n))` is a
/// packet of `n` bytes in the buffer, `Ok(None)` means no data arrived
/// within the poll interval.
pub trait PacketSource {
    fn next_packet(&mut self, buf: &mut [u8]) -> Result<Option<usize>, CaptureError>;
}

/// The process's one capture resource: a datagram socket bound to a local
/// endpoint for the session. Released when dropped.
pub struct CaptureSource {
    socket: UdpSocket,
}

impl CaptureSource {
    /// Binds the capture endpoint. A bind failure is fatal to startup;
    /// callers must not continue without a capture source.
    pub fn open(bind: SocketAddr) -> Result<CaptureSource, CaptureError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .and_then(|s| {
                s.set_reuse_address(true)?;
                s.set_read_timeout(Some(RECV_TIMEOUT))?;
                s.bind(&bind.into())?;
                Ok(s)
            })
            .map_err(|source| CaptureError::BindFailed { addr: bind, source })?;

        info!("capture socket bound to {}", bind);
        Ok(CaptureSource {
            socket: socket.into(),
        })
    }

    /// The address actually bound, useful when the caller asked for port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl PacketSource for CaptureSource {
    fn next_packet(&mut self, buf: &mut [u8]) -> Result<Option<usize>, CaptureError> {
        match self.socket.recv(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ) =>
            {
                Ok(None)
            }
            Err(e) => Err(CaptureError::RecvFailed(e)),
        }
    }
}
