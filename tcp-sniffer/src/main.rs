use clap::{Parser, ValueEnum};
use std::io;
use tcp_sniffer::{CaptureProtocol, RawSocketSource};
use tracing::{error, info};

mod process;
mod stats;

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum Protocol {
    #[default]
    Tcp,
    Udp,
    Icmp,
}

impl From<Protocol> for CaptureProtocol {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Tcp => CaptureProtocol::Tcp,
            Protocol::Udp => CaptureProtocol::Udp,
            Protocol::Icmp => CaptureProtocol::Icmp,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tcp-sniffer")]
#[command(about = "Raw socket IPv4/TCP packet dissector", long_about = None)]
struct Args {
    /// Protocol the raw socket subscribes to
    #[arg(short, long, value_enum, default_value_t = Protocol::Tcp)]
    protocol: Protocol,

    /// Stop after this many receive attempts
    #[arg(short, long, value_name = "N")]
    count: Option<u64>,

    /// Receive buffer size in bytes
    #[arg(short, long, value_name = "BYTES", default_value_t = 0x10000)]
    buffer_size: usize,

    /// one line per datagram
    #[arg(long)]
    brief: bool,

    /// print statistics at the end, needs --count since the loop
    /// otherwise only stops when the process is killed
    #[arg(short, long, requires = "count")]
    stats: bool,
}

fn main() {
    // Reports go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    info!("Starting sniffer");
    let mut source = match RawSocketSource::open(args.protocol.into()) {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(protocol = %source.protocol(), count = ?args.count, "Capturing");

    let options = process::LoopOptions {
        count: args.count,
        brief: args.brief,
    };
    let mut buffer = vec![0u8; args.buffer_size];
    let mut stats = stats::Stats::default();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let start = std::time::Instant::now();

    if let Err(e) = process::capture_loop(&mut source, &mut out, &mut buffer, &options, &mut stats)
    {
        error!("Failed to write report: {}", e);
        std::process::exit(1);
    }

    info!(
        "Total datagrams: {}, malformed: {}, receive failures: {}, {:.3}s",
        stats.total_datagrams,
        stats.total_malformed(),
        stats.capture_errors,
        start.elapsed().as_secs_f64()
    );

    if args.stats {
        if let Err(e) = stats.write_to(&mut out) {
            error!("Failed to write statistics: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_requires_count() {
        let err = Args::try_parse_from(["tcp-sniffer", "--stats"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let args = Args::try_parse_from(["tcp-sniffer", "-s", "-c", "10"]).unwrap();
        assert!(args.stats);
        assert_eq!(args.count, Some(10));
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["tcp-sniffer"]).unwrap();
        assert!(matches!(args.protocol, Protocol::Tcp));
        assert_eq!(args.buffer_size, 0x10000);
        assert_eq!(args.count, None);
        assert!(!args.brief);
        assert!(!args.stats);
    }

    #[test]
    fn test_protocol_mapping() {
        let args = Args::try_parse_from(["tcp-sniffer", "-p", "icmp"]).unwrap();
        assert_eq!(CaptureProtocol::from(args.protocol), CaptureProtocol::Icmp);
    }
}
