//! UDP protocol - RFC 768
//!
//! Header view and the field offsets the translator needs for checksum
//! rewriting.

use crate::{Error, Result};

/// UDP header size (fixed)
pub const HEADER_SIZE: usize = 8;

/// Byte offset of the checksum field within the UDP header
pub const CHECKSUM_OFFSET: usize = 6;

/// Parsed UDP header (zero-copy reference)
#[derive(Debug)]
pub struct UdpHeader<'a> {
    buffer: &'a [u8],
}

impl<'a> UdpHeader<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            return Err(Error::Parse("UDP header too short".into()));
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

    /// Length (header + data) (offset 4-5)
    pub fn length(&self) -> u16 {
        u16::from_be_bytes([self.buffer[4], self.buffer[5]])
    }

    /// Checksum (offset 6-7)
    /// Note: 0 means checksum not computed (valid for UDP over IPv4 only)
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.buffer[6], self.buffer[7]])
    }

    /// Payload (data after header)
    pub fn payload(&self) -> &[u8] {
        &self.buffer[HEADER_SIZE..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let data = [0xab, 0xcd, 0x12, 0x34, 0x00, 0x0c, 0xe3, 0x31, 0x61, 0x62, 0x63, 0x64];
        let hdr = UdpHeader::parse(&data).unwrap();

        assert_eq!(hdr.src_port(), 0xabcd);
        assert_eq!(hdr.dst_port(), 0x1234);
        assert_eq!(hdr.length(), 12);
        assert_eq!(hdr.checksum(), 0xe331);
        assert_eq!(hdr.payload(), b"abcd");
    }

    #[test]
    fn test_parse_too_short() {
        assert!(UdpHeader::parse(&[0u8; 7]).is_err());
    }
}
