//! IPv4 (Internet Protocol version 4) header view
//!
//! Decodes the header defined in RFC 791 field by field from a
//! [`RawFrame`]. Nothing is cast in place: every multi-byte field is read
//! big-endian through the frame's bounded accessors.
//!
//! # IPv4 Header Format
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |Version|  IHL  |Type of Service|          Total Length         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |         Identification        |Flags|      Fragment Offset    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Time to Live |    Protocol   |         Header Checksum       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                       Source Address                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Destination Address                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Options (if IHL > 5)                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! # Examples
//!
//! ```
//! use std::net::Ipv4Addr;
//! use tcp_sniffer::packet::ipv4::Ipv4HeaderView;
//! use tcp_sniffer::{ProtocolKind, RawFrame};
//!
//! let packet = [
//!     0x45,              // Version=4, IHL=5 (20 bytes)
//!     0x00,              // Type of service
//!     0x00, 0x28,        // Total length: 40 bytes
//!     0x1c, 0x46,        // Identification
//!     0x40, 0x00,        // Flags=DF, Fragment offset=0
//!     0x40,              // TTL: 64
//!     0x06,              // Protocol: TCP (6)
//!     0xb1, 0xe6,        // Checksum (displayed, not validated)
//!     0xC0, 0xA8, 0x01, 0x01,  // Source: 192.168.1.1
//!     0xC0, 0xA8, 0x01, 0x02,  // Destination: 192.168.1.2
//! ];
//!
//! let frame = RawFrame::new(&packet, packet.len()).unwrap();
//! let header = Ipv4HeaderView::parse(frame).unwrap();
//! assert_eq!(header.version(), 4);
//! assert_eq!(header.header_len(), 20);
//! assert_eq!(header.total_length(), 40);
//! assert_eq!(header.protocol(), ProtocolKind::Tcp);
//! assert_eq!(header.src_ip(), Ipv4Addr::new(192, 168, 1, 1));
//! assert_eq!(header.checksum(), 0xb1e6);
//! ```

use std::fmt::{self, Formatter};
use std::net::Ipv4Addr;

use crate::packet::frame::RawFrame;
use crate::packet::protocol::{classify, ProtocolKind};
use crate::packet::{PacketHeaderError, Violation};

const NAME: &str = "IPv4";

/// Parsed IPv4 header
///
/// Holds the decoded fixed fields and borrows the options bytes from the
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4HeaderView<'a> {
    ver_ihl: u8,
    tos: u8,
    total_length: u16,
    identification: u16,
    flags_frag_offset: u16,
    ttl: u8,
    protocol: u8,
    checksum: u16,
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    raw_options: &'a [u8],
}

impl<'a> Ipv4HeaderView<'a> {
    /// Length of the header without options
    pub const FIXED_LEN: usize = 20;

    const OFFSET_MASK: u16 = 0x1FFF;
    const MF_FLAG_MASK: u16 = 0x2000;
    const DF_FLAG_MASK: u16 = 0x4000;

    /// Parses the IPv4 header at the start of `frame`.
    ///
    /// Fails when the frame is shorter than 20 bytes, the version is not 4,
    /// IHL is below 5, or IHL claims more bytes than the frame holds.
    pub fn parse(frame: RawFrame<'a>) -> Result<Self, PacketHeaderError> {
        if frame.len() < Self::FIXED_LEN {
            return Err(PacketHeaderError::malformed(
                NAME,
                Violation::TooShort {
                    needed: Self::FIXED_LEN,
                    available: frame.len(),
                },
            ));
        }

        let ver_ihl = frame.byte_at(0)?;
        let version = ver_ihl >> 4;
        if version != 4 {
            return Err(PacketHeaderError::malformed(
                NAME,
                Violation::BadVersion(version),
            ));
        }

        let ihl = ver_ihl & 0x0F;
        if ihl < 5 {
            return Err(PacketHeaderError::malformed(
                NAME,
                Violation::HeaderLengthTooSmall(ihl),
            ));
        }

        let header_len = ihl as usize * 4;
        if header_len > frame.len() {
            return Err(PacketHeaderError::malformed(
                NAME,
                Violation::HeaderLengthExceedsFrame {
                    claimed: header_len,
                    available: frame.len(),
                },
            ));
        }

        Ok(Ipv4HeaderView {
            ver_ihl,
            tos: frame.byte_at(1)?,
            total_length: frame.read_u16_be(2)?,
            identification: frame.read_u16_be(4)?,
            flags_frag_offset: frame.read_u16_be(6)?,
            ttl: frame.byte_at(8)?,
            protocol: frame.byte_at(9)?,
            checksum: frame.read_u16_be(10)?,
            src_ip: frame.read_octets(12)?,
            dst_ip: frame.read_octets(16)?,
            raw_options: frame.slice(Self::FIXED_LEN, header_len)?,
        })
    }

    #[inline]
    pub fn version(&self) -> u8 {
        self.ver_ihl >> 4
    }

    /// Header length in 32-bit words
    #[inline]
    pub fn ihl(&self) -> u8 {
        self.ver_ihl & 0x0F
    }

    /// Header length in bytes, options included. This is where the
    /// transport header starts.
    #[inline]
    pub fn header_len(&self) -> usize {
        self.ihl() as usize * 4
    }

    #[inline]
    pub fn tos(&self) -> u8 {
        self.tos
    }

    /// Total datagram length as declared by the sender. Informational only,
    /// the frame length bounds every read.
    #[inline]
    pub fn total_length(&self) -> u16 {
        self.total_length
    }

    #[inline]
    pub fn id(&self) -> u16 {
        self.identification
    }

    #[inline]
    pub fn flags(&self) -> u8 {
        (self.flags_frag_offset >> 13) as u8
    }

    #[inline]
    pub fn fragment_offset(&self) -> u16 {
        self.flags_frag_offset & Self::OFFSET_MASK
    }

    #[inline]
    pub fn has_dont_fragment(&self) -> bool {
        self.flags_frag_offset & Self::DF_FLAG_MASK != 0
    }

    #[inline]
    pub fn has_more_fragments(&self) -> bool {
        self.flags_frag_offset & Self::MF_FLAG_MASK != 0
    }

    /// True for any fragment: MF set or a non-zero offset
    #[inline]
    pub fn is_fragment(&self) -> bool {
        self.flags_frag_offset & (Self::MF_FLAG_MASK | Self::OFFSET_MASK) != 0
    }

    #[inline]
    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    #[inline]
    pub fn protocol_code(&self) -> u8 {
        self.protocol
    }

    #[inline]
    pub fn protocol(&self) -> ProtocolKind {
        classify(self.protocol)
    }

    /// Header checksum as carried on the wire. Never recomputed.
    #[inline]
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    #[inline]
    pub fn src_ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.src_ip)
    }

    #[inline]
    pub fn dst_ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.dst_ip)
    }

    #[inline]
    pub fn src_ip_raw(&self) -> [u8; 4] {
        self.src_ip
    }

    #[inline]
    pub fn dst_ip_raw(&self) -> [u8; 4] {
        self.dst_ip
    }

    #[inline]
    pub fn has_options(&self) -> bool {
        self.ihl() > 5
    }

    /// Options bytes between the fixed header and `header_len()`
    #[inline]
    pub fn raw_options(&self) -> &'a [u8] {
        self.raw_options
    }

    /// Single line rendering, e.g. `IPv4 1.2.3.4 -> 5.6.7.8 proto=TCP ttl=64 len=40`
    pub fn summary(&self) -> Ipv4Summary<'_, 'a> {
        Ipv4Summary(self)
    }
}

impl fmt::Display for Ipv4HeaderView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "----------------- IP Header ------------------")?;
        writeln!(f, " - IP version: {}", self.version())?;
        writeln!(f, " - IP Header Length: {} bytes", self.header_len())?;
        writeln!(f, " - Type of Service: {}", self.tos())?;
        writeln!(f, " - IP Total Length: {} bytes", self.total_length())?;
        writeln!(f, " - Identification: {}", self.id())?;
        writeln!(f, " - TTL: {}", self.ttl())?;
        writeln!(f, " - Protocol: {}", self.protocol())?;
        writeln!(f, " - Checksum: 0x{:x}", self.checksum())?;
        writeln!(f, " - Source IP: {}", self.src_ip())?;
        write!(f, " - Destination IP: {}", self.dst_ip())
    }
}

pub struct Ipv4Summary<'h, 'a>(&'h Ipv4HeaderView<'a>);

impl fmt::Display for Ipv4Summary<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let h = self.0;
        write!(
            f,
            "IPv4 {} -> {} proto={} ttl={} len={}",
            h.src_ip(),
            h.dst_ip(),
            h.protocol(),
            h.ttl(),
            h.total_length()
        )?;

        if h.is_fragment() {
            write!(f, " frag offset={}", h.fragment_offset())?;
        }

        if h.has_options() {
            write!(f, " +opts")?;
        }

        Ok(())
    }
}
