//! Datagram acquisition
//!
//! The dissection code only needs a buffer and the number of bytes received
//! into it. [`DatagramSource`] is that one blocking operation, so the capture
//! loop can run against a raw socket in production and against scripted
//! buffers in tests.

use std::fmt;
use std::io::{self, Read};

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open raw socket: {0}")]
    Open(#[source] io::Error),
    #[error("recvfrom error, failed to get packets: {0}")]
    Receive(#[source] io::Error),
}

/// Something that blocks until one datagram is available and copies it into
/// a caller-provided buffer.
pub trait DatagramSource {
    /// Receives the next datagram into `buf` and returns the number of bytes
    /// written. Datagrams larger than `buf` are truncated to its length.
    fn recv_datagram(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError>;
}

impl<S: DatagramSource + ?Sized> DatagramSource for &mut S {
    #[inline]
    fn recv_datagram(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        (**self).recv_datagram(buf)
    }
}

/// Transport a raw IPv4 socket subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureProtocol {
    #[default]
    Tcp,
    Udp,
    Icmp,
}

impl CaptureProtocol {
    fn socket_protocol(self) -> Protocol {
        match self {
            CaptureProtocol::Tcp => Protocol::TCP,
            CaptureProtocol::Udp => Protocol::UDP,
            CaptureProtocol::Icmp => Protocol::ICMPV4,
        }
    }
}

impl fmt::Display for CaptureProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureProtocol::Tcp => f.write_str("tcp"),
            CaptureProtocol::Udp => f.write_str("udp"),
            CaptureProtocol::Icmp => f.write_str("icmp"),
        }
    }
}

/// `AF_INET`/`SOCK_RAW` socket delivering whole IPv4 datagrams, header
/// included. Opening one needs `CAP_NET_RAW` (or root).
///
/// The socket is closed when the source is dropped.
#[derive(Debug)]
pub struct RawSocketSource {
    socket: Socket,
    protocol: CaptureProtocol,
}

impl RawSocketSource {
    pub fn open(protocol: CaptureProtocol) -> Result<Self, CaptureError> {
        let socket = Socket::new_raw(Domain::IPV4, Type::RAW, Some(protocol.socket_protocol()))
            .map_err(CaptureError::Open)?;
        info!(%protocol, "raw socket opened");
        Ok(RawSocketSource { socket, protocol })
    }

    #[inline]
    pub fn protocol(&self) -> CaptureProtocol {
        self.protocol
    }
}

impl DatagramSource for RawSocketSource {
    fn recv_datagram(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        let len = self.socket.read(buf).map_err(CaptureError::Receive)?;
        debug!(len, "datagram received");
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneShot(Vec<u8>);

    impl DatagramSource for OneShot {
        fn recv_datagram(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
            let len = self.0.len().min(buf.len());
            buf[..len].copy_from_slice(&self.0[..len]);
            Ok(len)
        }
    }

    fn receive_once<S: DatagramSource>(mut source: S, buf: &mut [u8]) -> usize {
        source.recv_datagram(buf).unwrap()
    }

    #[test]
    fn test_source_through_mut_ref() {
        let mut source = OneShot(vec![1, 2, 3]);
        let mut buf = [0u8; 2];

        // datagram larger than the buffer is truncated
        assert_eq!(receive_once(&mut source, &mut buf), 2);
        assert_eq!(buf, [1, 2]);

        let mut buf = [0u8; 8];
        assert_eq!(receive_once(&mut source, &mut buf), 3);
    }

    #[test]
    fn test_capture_protocol_mapping() {
        assert_eq!(CaptureProtocol::default(), CaptureProtocol::Tcp);
        assert_eq!(CaptureProtocol::Tcp.socket_protocol(), Protocol::TCP);
        assert_eq!(CaptureProtocol::Udp.socket_protocol(), Protocol::UDP);
        assert_eq!(CaptureProtocol::Icmp.socket_protocol(), Protocol::ICMPV4);
        assert_eq!(CaptureProtocol::Icmp.to_string(), "icmp");
    }

    #[test]
    fn test_capture_error_messages() {
        let err = CaptureError::Receive(io::Error::other("boom"));
        assert_eq!(err.to_string(), "recvfrom error, failed to get packets: boom");

        let err = CaptureError::Open(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.to_string(), "failed to open raw socket: denied");
    }
}
