//! TCP (Transmission Control Protocol) header view
//!
//! Decodes the TCP header (RFC 793) that follows the IPv4 header inside a
//! [`RawFrame`]. The view is located by the IP header's byte length and is
//! bounded by the frame, never by the IP Total Length field.
//!
//! # TCP Header Format
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Source Port          |       Destination Port        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Acknowledgment Number                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Data |       |C|E|U|A|P|R|S|F|                               |
//! | Offset| Rsrvd |W|C|R|C|S|S|Y|I|            Window             |
//! |       |       |R|E|G|K|H|T|N|N|                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           Checksum            |         Urgent Pointer        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Options (if Data Offset > 5)               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! # Examples
//!
//! ```
//! use tcp_sniffer::packet::tcp::TcpHeaderView;
//! use tcp_sniffer::RawFrame;
//!
//! // TCP SYN segment, as if it followed a 20 byte IP header
//! let mut packet = vec![0u8; 20];
//! packet.extend_from_slice(&[
//!     0x1F, 0x90,              // Source port: 8080
//!     0x00, 0x50,              // Destination port: 80
//!     0x00, 0x00, 0x00, 0x01,  // Sequence number: 1
//!     0x00, 0x00, 0x00, 0x00,  // Acknowledgment number: 0
//!     0x50, 0x02,              // Data offset=5, Flags=SYN
//!     0xFF, 0xFF,              // Window size: 65535
//!     0x00, 0x00,              // Checksum
//!     0x00, 0x00,              // Urgent pointer
//! ]);
//!
//! let frame = RawFrame::new(&packet, packet.len()).unwrap();
//! let header = TcpHeaderView::parse(frame, 20).unwrap();
//! assert_eq!(header.src_port(), 8080);
//! assert_eq!(header.dst_port(), 80);
//! assert!(header.flags().syn);
//! assert!(!header.flags().ack);
//! assert_eq!(header.window_size(), 65535);
//! assert_eq!(header.end(), 40);
//! ```

use std::fmt::{self, Formatter};

use crate::packet::frame::RawFrame;
use crate::packet::{PacketHeaderError, Violation};

const NAME: &str = "TCP";

/// The six classic control bits of a TCP header, each decoded on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

impl TcpFlags {
    pub const FLAG_FIN: u8 = 0x01;
    pub const FLAG_SYN: u8 = 0x02;
    pub const FLAG_RST: u8 = 0x04;
    pub const FLAG_PSH: u8 = 0x08;
    pub const FLAG_ACK: u8 = 0x10;
    pub const FLAG_URG: u8 = 0x20;

    /// Decodes the low six bits of header byte 13. ECE and CWR are ignored.
    #[inline]
    pub fn from_bits(bits: u8) -> Self {
        TcpFlags {
            urg: bits & Self::FLAG_URG != 0,
            ack: bits & Self::FLAG_ACK != 0,
            psh: bits & Self::FLAG_PSH != 0,
            rst: bits & Self::FLAG_RST != 0,
            syn: bits & Self::FLAG_SYN != 0,
            fin: bits & Self::FLAG_FIN != 0,
        }
    }

    /// Compact letters of the set flags, e.g. `SA` for a SYN-ACK
    pub fn letters(&self) -> String {
        [
            (self.fin, 'F'),
            (self.syn, 'S'),
            (self.rst, 'R'),
            (self.psh, 'P'),
            (self.ack, 'A'),
            (self.urg, 'U'),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, letter)| *letter)
        .collect()
    }
}

/// Parsed TCP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeaderView<'a> {
    start: usize,
    src_port: u16,
    dst_port: u16,
    sequence_number: u32,
    acknowledgment_number: u32,
    data_offset: u8,
    flags: TcpFlags,
    window_size: u16,
    checksum: u16,
    urgent_pointer: u16,
    raw_options: &'a [u8],
}

impl<'a> TcpHeaderView<'a> {
    /// Length of the header without options
    pub const FIXED_LEN: usize = 20;

    /// Parses the TCP header starting at `ip_header_end`.
    ///
    /// Fails when fewer than 20 bytes follow `ip_header_end`, when the data
    /// offset is below 5 words, or when the data offset reaches past the
    /// end of the frame.
    pub fn parse(frame: RawFrame<'a>, ip_header_end: usize) -> Result<Self, PacketHeaderError> {
        let available = frame.len().saturating_sub(ip_header_end);
        if available < Self::FIXED_LEN {
            return Err(PacketHeaderError::malformed(
                NAME,
                Violation::TooShort {
                    needed: Self::FIXED_LEN,
                    available,
                },
            ));
        }

        let base = ip_header_end;
        let data_offset = frame.byte_at(base + 12)? >> 4;
        if data_offset < 5 {
            return Err(PacketHeaderError::malformed(
                NAME,
                Violation::HeaderLengthTooSmall(data_offset),
            ));
        }

        let header_len = data_offset as usize * 4;
        if header_len > available {
            return Err(PacketHeaderError::malformed(
                NAME,
                Violation::HeaderLengthExceedsFrame {
                    claimed: header_len,
                    available,
                },
            ));
        }

        Ok(TcpHeaderView {
            start: base,
            src_port: frame.read_u16_be(base)?,
            dst_port: frame.read_u16_be(base + 2)?,
            sequence_number: frame.read_u32_be(base + 4)?,
            acknowledgment_number: frame.read_u32_be(base + 8)?,
            data_offset,
            flags: TcpFlags::from_bits(frame.byte_at(base + 13)?),
            window_size: frame.read_u16_be(base + 14)?,
            checksum: frame.read_u16_be(base + 16)?,
            // read little-endian: the value a sniffer prints when it skips
            // ntohs on an x86 host
            urgent_pointer: frame.read_u16_le(base + 18)?,
            raw_options: frame.slice(base + Self::FIXED_LEN, base + header_len)?,
        })
    }

    #[inline]
    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    #[inline]
    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    #[inline]
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    #[inline]
    pub fn acknowledgment_number(&self) -> u32 {
        self.acknowledgment_number
    }

    /// Data offset (header length) in 32-bit words
    #[inline]
    pub fn data_offset(&self) -> u8 {
        self.data_offset
    }

    /// Header length in bytes, options included
    #[inline]
    pub fn header_len(&self) -> usize {
        self.data_offset as usize * 4
    }

    /// Frame offset of the first byte after this header
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.header_len()
    }

    #[inline]
    pub fn flags(&self) -> TcpFlags {
        self.flags
    }

    #[inline]
    pub fn window_size(&self) -> u16 {
        self.window_size
    }

    /// Checksum as carried on the wire. Never verified.
    #[inline]
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Urgent pointer as the unconverted wire value seen on a
    /// little-endian host, so wire bytes `01 02` give 513
    #[inline]
    pub fn urgent_pointer(&self) -> u16 {
        self.urgent_pointer
    }

    #[inline]
    pub fn raw_options(&self) -> &'a [u8] {
        self.raw_options
    }

    /// Single line rendering, e.g. `TCP 80 -> 443 [SA] seq=1 ack=0 win=512`
    pub fn summary(&self) -> TcpSummary<'_, 'a> {
        TcpSummary(self)
    }
}

impl fmt::Display for TcpHeaderView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let flags = self.flags();
        writeln!(f, "----------------- TCP Header -----------------")?;
        writeln!(f, " - Source Port: {}", self.src_port())?;
        writeln!(f, " - Destination Port: {}", self.dst_port())?;
        writeln!(f, " - Sequence Number: {}", self.sequence_number())?;
        writeln!(f, " - Acknowledge Number: {}", self.acknowledgment_number())?;
        writeln!(f, " - Header Length: {}", self.header_len())?;
        writeln!(f, " - Urgent Flag: {}", flags.urg)?;
        writeln!(f, " - Acknowledgement Flag: {}", flags.ack)?;
        writeln!(f, " - Push Flag: {}", flags.psh)?;
        writeln!(f, " - Reset Flag: {}", flags.rst)?;
        writeln!(f, " - Synchronize Flag: {}", flags.syn)?;
        writeln!(f, " - Finish Flag: {}", flags.fin)?;
        writeln!(f, " - Window: {}", self.window_size())?;
        writeln!(f, " - Checksum: 0x{:x}", self.checksum())?;
        write!(f, " - Urgent Pointer: {}", self.urgent_pointer())
    }
}

pub struct TcpSummary<'h, 'a>(&'h TcpHeaderView<'a>);

impl fmt::Display for TcpSummary<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let h = self.0;
        write!(
            f,
            "TCP {} -> {} [{}] seq={} ack={} win={}",
            h.src_port(),
            h.dst_port(),
            h.flags().letters(),
            h.sequence_number(),
            h.acknowledgment_number(),
            h.window_size()
        )?;

        if h.data_offset() > 5 {
            write!(f, " +opts")?;
        }

        Ok(())
    }
}
