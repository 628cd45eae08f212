use std::fmt::Display;
use std::io::{self, Write};

use tcp_sniffer::{PacketHeaderError, ProtocolKind, Violation};

/// Per-run counters
///
/// The capture loop is single threaded, so these are plain integers owned
/// by the loop and printed once it ends.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    // General statistics
    pub total_datagrams: u64,
    pub total_bytes: u64,

    // Receive failures
    pub capture_errors: u64,

    // Dissection errors
    pub too_short: u64,
    pub bad_version: u64,
    pub header_too_small: u64,
    pub header_exceeds_frame: u64,
    pub out_of_bounds: u64,

    // Transport protocols
    pub icmp: u64,
    pub igmp: u64,
    pub tcp: u64,
    pub udp: u64,
    pub igrp: u64,
    pub ospf: u64,
    pub other: u64,
}

impl Stats {
    #[inline]
    pub fn record_datagram(&mut self, len: usize) {
        self.total_datagrams += 1;
        self.total_bytes += len as u64;
    }

    #[inline]
    pub fn record_protocol(&mut self, kind: ProtocolKind) {
        match kind {
            ProtocolKind::Icmp => self.icmp += 1,
            ProtocolKind::Igmp => self.igmp += 1,
            ProtocolKind::Tcp => self.tcp += 1,
            ProtocolKind::Udp => self.udp += 1,
            ProtocolKind::Igrp => self.igrp += 1,
            ProtocolKind::Ospf => self.ospf += 1,
            ProtocolKind::Other(_) => self.other += 1,
        }
    }

    #[inline]
    pub fn record_error(&mut self, err: &PacketHeaderError) {
        match err {
            PacketHeaderError::MalformedHeader { violation, .. } => match violation {
                Violation::TooShort { .. } => self.too_short += 1,
                Violation::BadVersion(_) => self.bad_version += 1,
                Violation::HeaderLengthTooSmall(_) => self.header_too_small += 1,
                Violation::HeaderLengthExceedsFrame { .. } => self.header_exceeds_frame += 1,
            },
            PacketHeaderError::OutOfBounds { .. } => self.out_of_bounds += 1,
        }
    }

    #[inline]
    pub fn record_capture_error(&mut self) {
        self.capture_errors += 1;
    }

    /// Writes the statistics block and flushes `out`
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{self}")?;
        out.flush()
    }

    pub fn total_malformed(&self) -> u64 {
        self.too_short
            + self.bad_version
            + self.header_too_small
            + self.header_exceeds_frame
            + self.out_of_bounds
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Capture Statistics ===")?;
        writeln!(f)?;

        writeln!(f, "--- General ---")?;
        writeln!(f, "Datagrams received: {}", self.total_datagrams)?;
        writeln!(f, "Bytes received: {}", self.total_bytes)?;
        writeln!(f, "Receive failures: {}", self.capture_errors)?;
        writeln!(f)?;

        writeln!(f, "--- Malformed ---")?;
        writeln!(f, "Total malformed: {}", self.total_malformed())?;
        writeln!(f, "  Too short: {}", self.too_short)?;
        writeln!(f, "  Bad version: {}", self.bad_version)?;
        writeln!(f, "  Header length below minimum: {}", self.header_too_small)?;
        writeln!(f, "  Header length past frame: {}", self.header_exceeds_frame)?;
        if self.out_of_bounds > 0 {
            writeln!(f, "  Out of bounds reads: {}", self.out_of_bounds)?;
        }
        writeln!(f)?;

        writeln!(f, "--- Transport ---")?;
        writeln!(f, "ICMP: {}", self.icmp)?;
        writeln!(f, "IGMP: {}", self.igmp)?;
        writeln!(f, "TCP: {}", self.tcp)?;
        writeln!(f, "UDP: {}", self.udp)?;
        writeln!(f, "IGRP: {}", self.igrp)?;
        writeln!(f, "OSPF: {}", self.ospf)?;
        write!(f, "Other: {}", self.other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_datagram_and_protocol() {
        let mut stats = Stats::default();
        stats.record_datagram(60);
        stats.record_datagram(40);
        stats.record_protocol(ProtocolKind::Tcp);
        stats.record_protocol(ProtocolKind::Ospf);
        stats.record_protocol(ProtocolKind::Other(132));

        assert_eq!(stats.total_datagrams, 2);
        assert_eq!(stats.total_bytes, 100);
        assert_eq!(stats.tcp, 1);
        assert_eq!(stats.ospf, 1);
        assert_eq!(stats.igrp, 0);
        assert_eq!(stats.other, 1);
    }

    #[test]
    fn test_record_error_by_violation() {
        let mut stats = Stats::default();
        stats.record_error(&PacketHeaderError::MalformedHeader {
            header: "IPv4",
            violation: Violation::BadVersion(6),
        });
        stats.record_error(&PacketHeaderError::MalformedHeader {
            header: "TCP",
            violation: Violation::HeaderLengthExceedsFrame {
                claimed: 60,
                available: 20,
            },
        });
        stats.record_error(&PacketHeaderError::OutOfBounds {
            start: 0,
            end: 4,
            len: 2,
        });

        assert_eq!(stats.bad_version, 1);
        assert_eq!(stats.header_exceeds_frame, 1);
        assert_eq!(stats.out_of_bounds, 1);
        assert_eq!(stats.total_malformed(), 3);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_to_reports_write_errors() {
        let stats = Stats::default();
        let err = stats.write_to(&mut ClosedPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let mut out = Vec::new();
        stats.write_to(&mut out).unwrap();
        assert!(out.ends_with(b"Other: 0\n"));
    }

    #[test]
    fn test_display_sections() {
        let mut stats = Stats::default();
        stats.record_datagram(41);
        stats.record_protocol(ProtocolKind::Tcp);
        stats.record_capture_error();

        let text = stats.to_string();
        assert!(text.starts_with("=== Capture Statistics ===\n"));
        assert!(text.contains("Datagrams received: 1\n"));
        assert!(text.contains("Receive failures: 1\n"));
        assert!(text.contains("TCP: 1\n"));
        assert!(!text.contains("Out of bounds"));
    }
}
