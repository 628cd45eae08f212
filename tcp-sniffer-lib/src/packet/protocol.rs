//! IP protocol classification
//!
//! Maps the IPv4 Protocol field onto the handful of transports the sniffer
//! names. Everything else keeps its raw code in [`ProtocolKind::Other`].
//!
//! ```
//! use tcp_sniffer::{classify, ProtocolKind};
//!
//! assert_eq!(classify(6), ProtocolKind::Tcp);
//! assert_eq!(classify(89).to_string(), "OSPF");
//! assert_eq!(classify(132), ProtocolKind::Other(132));
//! assert_eq!(u8::from(classify(132)), 132);
//! ```

use std::fmt;

/// Transport carried by an IPv4 datagram, from its protocol byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    Icmp,
    Igmp,
    Tcp,
    Udp,
    Igrp,
    Ospf,
    Other(u8),
}

impl ProtocolKind {
    pub const ICMP: u8 = 1;
    pub const IGMP: u8 = 2;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const IGRP: u8 = 88;
    pub const OSPF: u8 = 89;

    /// Returns the protocol label used in reports
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolKind::Icmp => "ICMP",
            ProtocolKind::Igmp => "IGMP",
            ProtocolKind::Tcp => "TCP",
            ProtocolKind::Udp => "UDP",
            ProtocolKind::Igrp => "IGRP",
            ProtocolKind::Ospf => "OSPF",
            ProtocolKind::Other(_) => "Other",
        }
    }

    #[inline]
    pub fn is_tcp(&self) -> bool {
        matches!(self, ProtocolKind::Tcp)
    }
}

/// Classifies an IPv4 protocol number. Total over `u8`.
#[inline]
pub fn classify(code: u8) -> ProtocolKind {
    match code {
        ProtocolKind::ICMP => ProtocolKind::Icmp,
        ProtocolKind::IGMP => ProtocolKind::Igmp,
        ProtocolKind::TCP => ProtocolKind::Tcp,
        ProtocolKind::UDP => ProtocolKind::Udp,
        ProtocolKind::IGRP => ProtocolKind::Igrp,
        ProtocolKind::OSPF => ProtocolKind::Ospf,
        other => ProtocolKind::Other(other),
    }
}

impl From<u8> for ProtocolKind {
    #[inline]
    fn from(code: u8) -> Self {
        classify(code)
    }
}

impl From<ProtocolKind> for u8 {
    fn from(kind: ProtocolKind) -> Self {
        match kind {
            ProtocolKind::Icmp => ProtocolKind::ICMP,
            ProtocolKind::Igmp => ProtocolKind::IGMP,
            ProtocolKind::Tcp => ProtocolKind::TCP,
            ProtocolKind::Udp => ProtocolKind::UDP,
            ProtocolKind::Igrp => ProtocolKind::IGRP,
            ProtocolKind::Ospf => ProtocolKind::OSPF,
            ProtocolKind::Other(code) => code,
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolKind::Other(code) => write!(f, "Other({})", code),
            known => f.write_str(known.name()),
        }
    }
}
