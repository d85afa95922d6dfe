use std::net::SocketAddr;
use thiserror::Error;

/// Errors from the capture socket. Both variants are fatal to their scope:
/// a bind failure aborts startup, a receive failure ends the capture loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to bind capture socket to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to receive packet: {0}")]
    RecvFailed(#[from] std::io::Error),
}

/// Recoverable per-packet errors; the loop skips the packet and continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("packet too short: {len} bytes, need at least {min}", min = crate::packet::MIN_PACKET_LEN)]
    TooShort { len: usize },
}

/// Invalid filter input from the console; the command is rejected and the
/// previous criteria stay in effect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid IP address: {0:?}")]
    InvalidIp(String),
    #[error("invalid port: {0:?}")]
    InvalidPort(String),
}
