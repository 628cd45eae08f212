//! Per-datagram report combining every decoded layer
//!
//! [`PacketReport::build`] always decodes the IPv4 header. It decodes TCP
//! only when the protocol field says TCP, and the payload is whatever
//! follows the last decoded header. `Display` renders the full multi-line
//! report, and [`PacketReport::summary`] a single line.
//!
//! ```
//! use tcp_sniffer::{PacketReport, RawFrame};
//!
//! let mut datagram = vec![
//!     0x45, 0x00, 0x00, 0x29, 0x00, 0x01, 0x00, 0x00, 0x40, 0x06, 0x00, 0x00,
//!     1, 2, 3, 4, 5, 6, 7, 8,
//! ];
//! datagram.extend_from_slice(&[
//!     0x00, 0x50, 0x01, 0xBB, 0, 0, 0, 0, 0, 0, 0, 0, 0x50, 0x12, 0, 0, 0, 0, 0, 0,
//! ]);
//! datagram.push(0xFF);
//!
//! let frame = RawFrame::new(&datagram, datagram.len()).unwrap();
//! let report = PacketReport::build(frame).unwrap();
//! assert_eq!(report.payload().hex().to_string(), "ff");
//! assert_eq!(
//!     report.summary().to_string(),
//!     "IPv4 1.2.3.4 -> 5.6.7.8 proto=TCP ttl=64 len=41 | TCP 80 -> 443 [SA] seq=0 ack=0 win=0 | payload=1"
//! );
//! ```

use std::fmt;

use crate::packet::frame::RawFrame;
use crate::packet::ipv4::Ipv4HeaderView;
use crate::packet::payload::PayloadView;
use crate::packet::protocol::ProtocolKind;
use crate::packet::tcp::TcpHeaderView;
use crate::packet::PacketHeaderError;

const TCP_BANNER: &str = "================= TCP Packet =================";
const IP_BANNER: &str = "================= IP Packet ==================";
const SECTION_RULE: &str = "----------------------------------------------";
const CLOSING_RULE: &str = "==============================================";

/// The decoded layers of one datagram, ready to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketReport<'a> {
    ip: Ipv4HeaderView<'a>,
    transport: Option<TcpHeaderView<'a>>,
    payload: PayloadView<'a>,
}

impl<'a> PacketReport<'a> {
    /// Decodes one datagram.
    ///
    /// Any malformed header aborts the whole report. For non-TCP datagrams
    /// the payload is everything after the IP header.
    pub fn build(frame: RawFrame<'a>) -> Result<Self, PacketHeaderError> {
        let ip = Ipv4HeaderView::parse(frame)?;

        let (transport, payload_start) = if ip.protocol().is_tcp() {
            let tcp = TcpHeaderView::parse(frame, ip.header_len())?;
            (Some(tcp), tcp.end())
        } else {
            (None, ip.header_len())
        };

        Ok(PacketReport {
            ip,
            transport,
            payload: PayloadView::slice_after(frame, payload_start),
        })
    }

    #[inline]
    pub fn ip(&self) -> &Ipv4HeaderView<'a> {
        &self.ip
    }

    #[inline]
    pub fn transport(&self) -> Option<&TcpHeaderView<'a>> {
        self.transport.as_ref()
    }

    #[inline]
    pub fn payload(&self) -> &PayloadView<'a> {
        &self.payload
    }

    #[inline]
    pub fn protocol(&self) -> ProtocolKind {
        self.ip.protocol()
    }

    pub fn summary(&self) -> ReportSummary<'_, 'a> {
        ReportSummary(self)
    }
}

impl fmt::Display for PacketReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.transport {
            Some(tcp) => {
                writeln!(f, "{}", TCP_BANNER)?;
                writeln!(f, "{}", self.ip)?;
                writeln!(f, "{}", tcp)?;
                writeln!(f, "{}", SECTION_RULE)?;
                writeln!(f, "{}", self.payload.hex())?;
            }
            None => {
                writeln!(f, "{}", IP_BANNER)?;
                writeln!(f, "{}", self.ip)?;
            }
        }
        write!(f, "{}", CLOSING_RULE)
    }
}

pub struct ReportSummary<'r, 'a>(&'r PacketReport<'a>);

impl fmt::Display for ReportSummary<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        write!(f, "{}", report.ip.summary())?;
        if let Some(tcp) = &report.transport {
            write!(f, " | {}", tcp.summary())?;
        }
        write!(f, " | payload={}", report.payload.len())
    }
}
