//! TCP protocol - RFC 793
//!
//! Header view and the field offsets the translator needs for checksum
//! rewriting. NAT64 never touches ports or flags; only the pseudo-header
//! checksum changes.

use crate::{Error, Result};

/// Minimum TCP header size (no options)
pub const MIN_HEADER_SIZE: usize = 20;

/// Byte offset of the checksum field within the TCP header
pub const CHECKSUM_OFFSET: usize = 16;

/// Parsed TCP header (zero-copy reference)
#[derive(Debug)]
pub struct TcpHeader<'a> {
    buffer: &'a [u8],
}

impl<'a> TcpHeader<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < MIN_HEADER_SIZE {
            return Err(Error::Parse("TCP header too short".into()));
        }

        Ok(Self { buffer })
    }

    /// Source port (offset 0-1)
    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes([self.buffer[0], self.buffer[1]])
    }

    /// Destination port (offset 2-3)
    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes([self.buffer[2], self.buffer[3]])
    }

    /// Header length in bytes, from the data offset field
    pub fn header_len(&self) -> usize {
        ((self.buffer[12] >> 4) as usize) * 4
    }

    /// Checksum (offset 16-17)
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.buffer[16], self.buffer[17]])
    }
}
