use std::fmt;

use thiserror::Error;

pub mod frame;
pub mod ipv4;
pub mod payload;
pub mod protocol;
pub mod report;
pub mod tcp;

/// Which consistency check a header failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Fewer bytes available than the fixed part of the header needs
    TooShort { needed: usize, available: usize },
    /// IP version nibble is not 4
    BadVersion(u8),
    /// Header length field (in 32-bit words) below the minimum of 5
    HeaderLengthTooSmall(u8),
    /// Header length field claims more bytes than the frame holds
    HeaderLengthExceedsFrame { claimed: usize, available: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::TooShort { needed, available } => {
                write!(f, "too short (need {needed} bytes, have {available})")
            }
            Violation::BadVersion(v) => write!(f, "bad version {v}"),
            Violation::HeaderLengthTooSmall(words) => {
                write!(f, "header length {words} words is below the minimum of 5")
            }
            Violation::HeaderLengthExceedsFrame { claimed, available } => write!(
                f,
                "header claims {claimed} bytes but only {available} are available"
            ),
        }
    }
}

/// Why a datagram could not be dissected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketHeaderError {
    #[error("malformed {header} header: {violation}")]
    MalformedHeader {
        header: &'static str,
        violation: Violation,
    },
    /// A read outside the frame was attempted. The header checks are meant to
    /// make this unreachable, so seeing it points at a parser bug.
    #[error("out of bounds read [{start}..{end}) on a {len} byte frame")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

impl PacketHeaderError {
    #[inline]
    pub(crate) fn malformed(header: &'static str, violation: Violation) -> Self {
        PacketHeaderError::MalformedHeader { header, violation }
    }

    /// Returns the violated check for malformed headers
    pub fn violation(&self) -> Option<Violation> {
        match self {
            PacketHeaderError::MalformedHeader { violation, .. } => Some(*violation),
            PacketHeaderError::OutOfBounds { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_names_header_and_check() {
        let err = PacketHeaderError::malformed(
            "IPv4",
            Violation::TooShort {
                needed: 20,
                available: 7,
            },
        );
        assert_eq!(
            err.to_string(),
            "malformed IPv4 header: too short (need 20 bytes, have 7)"
        );
        assert_eq!(
            err.violation(),
            Some(Violation::TooShort {
                needed: 20,
                available: 7
            })
        );
    }

    #[test]
    fn test_out_of_bounds_has_no_violation() {
        let err = PacketHeaderError::OutOfBounds {
            start: 18,
            end: 22,
            len: 20,
        };
        assert_eq!(err.violation(), None);
        assert_eq!(err.to_string(), "out of bounds read [18..22) on a 20 byte frame");
    }
}
