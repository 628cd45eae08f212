//! Bounds-checked dissection of raw IPv4 datagrams.
//!
//! The [`packet`] module turns a captured buffer into a [`PacketReport`]:
//! an IPv4 header view, a TCP header view when the datagram carries TCP,
//! and the remaining payload. Every field read goes through [`RawFrame`],
//! so a truncated or malformed datagram yields a [`PacketHeaderError`]
//! instead of an out-of-bounds read.
//!
//! The [`capture`] module provides the receive side: the [`DatagramSource`]
//! trait and a raw socket implementation of it.
//!
//! ```
//! use tcp_sniffer::{PacketReport, RawFrame};
//!
//! let datagram = [
//!     0x45, 0x00, 0x00, 0x14, 0x00, 0x01, 0x00, 0x00, 0x40, 0x11, 0x00, 0x00,
//!     10, 0, 0, 1, 10, 0, 0, 2,
//! ];
//!
//! let frame = RawFrame::new(&datagram, datagram.len()).unwrap();
//! let report = PacketReport::build(frame).unwrap();
//! assert!(report.transport().is_none());
//! assert!(report.to_string().contains("Protocol: UDP"));
//! ```

pub mod capture;
pub mod packet;

pub use capture::{CaptureError, CaptureProtocol, DatagramSource, RawSocketSource};
pub use packet::frame::RawFrame;
pub use packet::protocol::{classify, ProtocolKind};
pub use packet::report::PacketReport;
pub use packet::{PacketHeaderError, Violation};
