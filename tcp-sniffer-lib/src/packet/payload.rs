//! Payload bytes after the recognized headers, and their hex rendering
//!
//! ```
//! use tcp_sniffer::packet::payload::PayloadView;
//! use tcp_sniffer::RawFrame;
//!
//! let bytes = [0x00, 0x11, 0xDE, 0xAD];
//! let frame = RawFrame::new(&bytes, bytes.len()).unwrap();
//!
//! let payload = PayloadView::slice_after(frame, 2);
//! assert_eq!(payload.hex().to_string(), "dead");
//!
//! let pairs: Vec<String> = payload.hex().into_iter().map(|p| p.to_string()).collect();
//! assert_eq!(pairs, ["de", "ad"]);
//! ```

use std::fmt;
use std::iter::FusedIterator;

use crate::packet::frame::RawFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadView<'a> {
    offset: usize,
    data: &'a [u8],
}

impl<'a> PayloadView<'a> {
    /// Everything from `transport_header_end` to the end of the frame.
    /// Empty when the offset is at or past the end.
    #[inline]
    pub fn slice_after(frame: RawFrame<'a>, transport_header_end: usize) -> Self {
        PayloadView {
            offset: transport_header_end.min(frame.len()),
            data: frame.tail(transport_header_end),
        }
    }

    /// Frame offset of the first payload byte
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn hex(&self) -> HexDump<'a> {
        HexDump(self.data)
    }
}

/// Lowercase hex rendering of a byte slice with no separators.
///
/// Nothing is formatted until the dump is displayed or iterated, and being
/// `Copy` it can be walked any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexDump<'a>(&'a [u8]);

impl<'a> HexDump<'a> {
    #[inline]
    pub fn iter(&self) -> HexPairs<'a> {
        HexPairs(self.0.iter())
    }
}

impl<'a> IntoIterator for HexDump<'a> {
    type Item = HexPair;
    type IntoIter = HexPairs<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|pair| write!(f, "{}", pair))
    }
}

/// One byte rendered as two hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexPair(pub u8);

impl fmt::Display for HexPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct HexPairs<'a>(std::slice::Iter<'a, u8>);

impl Iterator for HexPairs<'_> {
    type Item = HexPair;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().copied().map(HexPair)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for HexPairs<'_> {}

impl FusedIterator for HexPairs<'_> {}
