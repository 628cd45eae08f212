use std::io::{self, Write};

use tcp_sniffer::{DatagramSource, PacketHeaderError, PacketReport, RawFrame};
use tracing::{debug, error, warn};

use crate::stats::Stats;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopOptions {
    /// Stop after this many receive attempts, `None` runs forever
    pub count: Option<u64>,
    /// One line per datagram instead of the full report
    pub brief: bool,
}

/// Receive, dissect and print datagrams until the count is reached.
///
/// Receive failures and malformed datagrams are reported and skipped. The
/// loop only stops early if writing to `out` fails.
pub fn capture_loop<S: DatagramSource, W: Write>(
    source: &mut S,
    out: &mut W,
    buffer: &mut [u8],
    options: &LoopOptions,
    stats: &mut Stats,
) -> io::Result<()> {
    let mut attempt: u64 = 0;

    while options.count.map_or(true, |limit| attempt < limit) {
        attempt += 1;

        let len = match source.recv_datagram(buffer) {
            Ok(len) => len,
            Err(e) => {
                stats.record_capture_error();
                warn!(datagram = attempt, error = %e, "receive failed");
                writeln!(out, "#{attempt} {e}")?;
                continue;
            }
        };

        match RawFrame::new(buffer, len) {
            Ok(frame) => process_datagram(attempt, frame, out, options.brief, stats)?,
            Err(e) => {
                // the source reported more bytes than the buffer holds
                stats.record_error(&e);
                error!(datagram = attempt, error = %e, "receive length exceeds buffer");
                writeln!(out, "#{attempt} {e}")?;
            }
        }
    }

    Ok(())
}

/// Dissect a single datagram and write its report.
pub fn process_datagram<W: Write>(
    datagram: u64,
    frame: RawFrame<'_>,
    out: &mut W,
    brief: bool,
    stats: &mut Stats,
) -> io::Result<()> {
    stats.record_datagram(frame.len());
    debug!(datagram, len = frame.len(), "dissecting");

    if !brief {
        writeln!(out, "Received bytes: {}", frame.len())?;
    }

    match PacketReport::build(frame) {
        Ok(report) => {
            stats.record_protocol(report.protocol());
            if brief {
                writeln!(out, "{:>5}   {}", datagram, report.summary())
            } else {
                writeln!(out, "{}", report)
            }
        }
        Err(e) => {
            stats.record_error(&e);
            match &e {
                PacketHeaderError::MalformedHeader { .. } => {
                    warn!(datagram, len = frame.len(), error = %e, "dropping malformed datagram")
                }
                PacketHeaderError::OutOfBounds { .. } => {
                    error!(datagram, len = frame.len(), error = %e, "dissector read past frame")
                }
            }
            writeln!(out, "#{datagram} {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use tcp_sniffer::CaptureError;

    use super::*;

    /// Replays canned receive results, then fails every further call
    struct ScriptedSource {
        script: VecDeque<Result<Vec<u8>, io::ErrorKind>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<u8>, io::ErrorKind>>) -> Self {
            ScriptedSource {
                script: script.into(),
            }
        }
    }

    impl DatagramSource for ScriptedSource {
        fn recv_datagram(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
            match self.script.pop_front() {
                Some(Ok(bytes)) => {
                    let len = bytes.len().min(buf.len());
                    buf[..len].copy_from_slice(&bytes[..len]);
                    Ok(len)
                }
                Some(Err(kind)) => Err(CaptureError::Receive(io::Error::from(kind))),
                None => Err(CaptureError::Receive(io::Error::from(
                    io::ErrorKind::UnexpectedEof,
                ))),
            }
        }
    }

    /// A source that claims more bytes than it was given room for
    struct LyingSource;

    impl DatagramSource for LyingSource {
        fn recv_datagram(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
            Ok(buf.len() + 1)
        }
    }

    fn run(source: &mut impl DatagramSource, options: LoopOptions) -> (String, Stats) {
        let mut out = Vec::new();
        let mut buffer = vec![0u8; 0x10000];
        let mut stats = Stats::default();
        capture_loop(source, &mut out, &mut buffer, &options, &mut stats).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_loop_survives_errors() {
        let mut source = ScriptedSource::new(vec![
            Ok(create_tcp_datagram(&[0xFF])),
            Err(io::ErrorKind::Interrupted),
            Ok(vec![0x45; 10]),
            Ok(create_tcp_datagram(b"ok")),
        ]);

        let (text, stats) = run(
            &mut source,
            LoopOptions {
                count: Some(4),
                brief: false,
            },
        );

        assert_eq!(stats.total_datagrams, 3);
        assert_eq!(stats.capture_errors, 1);
        assert_eq!(stats.too_short, 1);
        assert_eq!(stats.tcp, 2);

        assert!(text.starts_with("Received bytes: 41\n================= TCP Packet"));
        assert!(text.contains("#2 recvfrom error, failed to get packets"));
        assert!(text.contains(
            "#3 malformed IPv4 header: too short (need 20 bytes, have 10)\n"
        ));
        assert!(text.contains("\n6f6b\n"));
    }

    #[test]
    fn test_loop_stops_at_count() {
        let mut source = ScriptedSource::new(vec![
            Ok(create_tcp_datagram(&[])),
            Ok(create_tcp_datagram(&[])),
            Ok(create_tcp_datagram(&[])),
        ]);

        let (_, stats) = run(
            &mut source,
            LoopOptions {
                count: Some(2),
                brief: true,
            },
        );

        assert_eq!(stats.total_datagrams, 2);
        assert_eq!(source.script.len(), 1);
    }

    #[test]
    fn test_loop_brief_output() {
        let mut source = ScriptedSource::new(vec![Ok(create_tcp_datagram(&[0xFF]))]);

        let (text, _) = run(
            &mut source,
            LoopOptions {
                count: Some(1),
                brief: true,
            },
        );

        assert_eq!(
            text,
            "    1   IPv4 1.2.3.4 -> 5.6.7.8 proto=TCP ttl=64 len=41 | TCP 80 -> 443 [SA] seq=0 ack=0 win=512 | payload=1\n"
        );
    }

    #[test]
    fn test_loop_rejects_length_past_buffer() {
        let (text, stats) = run(
            &mut LyingSource,
            LoopOptions {
                count: Some(1),
                brief: false,
            },
        );

        assert_eq!(stats.out_of_bounds, 1);
        assert_eq!(stats.total_datagrams, 0);
        assert!(text.starts_with("#1 out of bounds read"));
    }

    #[test]
    fn test_process_non_tcp_datagram() {
        let mut datagram = create_tcp_datagram(&[]);
        datagram[9] = 88;
        let frame = RawFrame::new(&datagram, datagram.len()).unwrap();

        let mut out = Vec::new();
        let mut stats = Stats::default();
        process_datagram(7, frame, &mut out, false, &mut stats).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(stats.igrp, 1);
        assert!(text.contains(" - Protocol: IGRP\n"));
        assert!(!text.contains("TCP Header"));
    }

    #[test]
    fn test_process_tcp_header_past_frame() {
        let mut datagram = create_tcp_datagram(&[]);
        datagram[32] = 0xF0; // data offset 15 on a 20 byte TCP header
        let frame = RawFrame::new(&datagram, datagram.len()).unwrap();

        let mut out = Vec::new();
        let mut stats = Stats::default();
        process_datagram(3, frame, &mut out, true, &mut stats).unwrap();

        assert_eq!(stats.header_exceeds_frame, 1);
        assert_eq!(stats.tcp, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "#3 malformed TCP header: header claims 60 bytes but only 20 are available\n"
        );
    }

    // IPv4 1.2.3.4 -> 5.6.7.8 carrying TCP 80 -> 443 with SYN+ACK
    fn create_tcp_datagram(payload: &[u8]) -> Vec<u8> {
        let total_len = (40 + payload.len()) as u16;
        let mut datagram = vec![0x45, 0x00];
        datagram.extend_from_slice(&total_len.to_be_bytes());
        datagram.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 64, 6, 0x00, 0x00]);
        datagram.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        datagram.extend_from_slice(&[0x00, 0x50, 0x01, 0xBB]);
        datagram.extend_from_slice(&[0; 8]);
        datagram.extend_from_slice(&[0x50, 0x12, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00]);

        datagram.extend_from_slice(payload);
        datagram
    }
}
