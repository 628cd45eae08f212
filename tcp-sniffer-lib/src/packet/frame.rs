//! Bounded view over one received datagram
//!
//! A [`RawFrame`] pairs the capture buffer with the byte count the receive
//! call reported. Every header parser reads through its accessors, so a
//! read past the received bytes comes back as
//! [`PacketHeaderError::OutOfBounds`] instead of touching stale buffer
//! contents.
//!
//! ```
//! use tcp_sniffer::RawFrame;
//!
//! let buffer = [0x45, 0x00, 0x00, 0x28, 0xAA, 0xBB];
//! // only the first four bytes were received
//! let frame = RawFrame::new(&buffer, 4).unwrap();
//!
//! assert_eq!(frame.len(), 4);
//! assert_eq!(frame.read_u16_be(2).unwrap(), 40);
//! assert!(frame.byte_at(4).is_err());
//! ```

use zerocopy::byteorder::{BigEndian, LittleEndian, U16, U32};
use zerocopy::FromBytes;

use crate::packet::PacketHeaderError;

/// The received bytes of one datagram, bounded by the receive length
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    data: &'a [u8],
}

impl<'a> RawFrame<'a> {
    /// Wraps the first `len` bytes of `buffer`.
    ///
    /// `len` must come from the receive call, never from a field inside the
    /// datagram.
    pub fn new(buffer: &'a [u8], len: usize) -> Result<Self, PacketHeaderError> {
        match buffer.get(..len) {
            Some(data) => Ok(RawFrame { data }),
            None => Err(PacketHeaderError::OutOfBounds {
                start: 0,
                end: len,
                len: buffer.len(),
            }),
        }
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
    pub fn byte_at(&self, offset: usize) -> Result<u8, PacketHeaderError> {
        self.data
            .get(offset)
            .copied()
            .ok_or_else(|| self.out_of_bounds(offset, offset.saturating_add(1)))
    }

    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> Result<&'a [u8], PacketHeaderError> {
        if start > end {
            return Err(self.out_of_bounds(start, end));
        }
        self.data
            .get(start..end)
            .ok_or_else(|| self.out_of_bounds(start, end))
    }

    /// Reads a network order `u16` at `offset`
    #[inline]
    pub fn read_u16_be(&self, offset: usize) -> Result<u16, PacketHeaderError> {
        let bytes = self.field(offset, 2)?;
        U16::<BigEndian>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| self.out_of_bounds(offset, offset + 2))
    }

    /// Reads a little-endian `u16` at `offset`
    #[inline]
    pub fn read_u16_le(&self, offset: usize) -> Result<u16, PacketHeaderError> {
        let bytes = self.field(offset, 2)?;
        U16::<LittleEndian>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| self.out_of_bounds(offset, offset + 2))
    }

    /// Reads a network order `u32` at `offset`
    #[inline]
    pub fn read_u32_be(&self, offset: usize) -> Result<u32, PacketHeaderError> {
        let bytes = self.field(offset, 4)?;
        U32::<BigEndian>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| self.out_of_bounds(offset, offset + 4))
    }

    /// Copies four bytes at `offset` as-is, e.g. an IPv4 address
    #[inline]
    pub fn read_octets(&self, offset: usize) -> Result<[u8; 4], PacketHeaderError> {
        let bytes = self.field(offset, 4)?;
        <[u8; 4]>::read_from_bytes(bytes).map_err(|_| self.out_of_bounds(offset, offset + 4))
    }

    /// Returns the bytes from `start` to the end of the frame, empty when
    /// `start` is at or past the end
    #[inline]
    pub fn tail(&self, start: usize) -> &'a [u8] {
        self.data.get(start..).unwrap_or_default()
    }

    #[inline]
    fn field(&self, offset: usize, width: usize) -> Result<&'a [u8], PacketHeaderError> {
        let end = offset
            .checked_add(width)
            .ok_or_else(|| self.out_of_bounds(offset, usize::MAX))?;
        self.slice(offset, end)
    }

    #[inline]
    fn out_of_bounds(&self, start: usize, end: usize) -> PacketHeaderError {
        PacketHeaderError::OutOfBounds {
            start,
            end,
            len: self.data.len(),
        }
    }
}
