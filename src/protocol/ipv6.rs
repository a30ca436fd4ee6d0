//! IPv6 protocol - RFC 8200
//!
//! Fixed-header parsing and construction, plus the NAT64 prefix type with
//! RFC 6052 IPv4 address embedding and extraction.

use crate::{Error, Result};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// IPv6 fixed header size (always 40 bytes)
pub const HEADER_SIZE: usize = 40;

/// IPv6 Next Header values (RFC 8200, IANA assignments)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NextHeader {
    Tcp = 6,
    Udp = 17,
    Icmpv6 = 58,
}

impl NextHeader {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            6 => Some(Self::Tcp),
            17 => Some(Self::Udp),
            58 => Some(Self::Icmpv6),
            _ => None,
        }
    }
}

/// Parsed IPv6 header (zero-copy reference)
#[derive(Debug)]
pub struct Ipv6Header<'a> {
    buffer: &'a [u8],
}

impl<'a> Ipv6Header<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            return Err(Error::Parse("IPv6 header too short".into()));
        }

        let version = buffer[0] >> 4;
        if version != 6 {
            return Err(Error::Parse("not an IPv6 packet".into()));
        }

        Ok(Self { buffer })
    }

    /// Version (always 6)
    pub fn version(&self) -> u8 {
        self.buffer[0] >> 4
    }

    /// Traffic Class (8 bits: 6-bit DSCP + 2-bit ECN)
    pub fn traffic_class(&self) -> u8 {
        ((self.buffer[0] & 0x0F) << 4) | (self.buffer[1] >> 4)
    }

    /// Flow Label (20 bits)
    pub fn flow_label(&self) -> u32 {
        let b1 = (self.buffer[1] & 0x0F) as u32;
        let b2 = self.buffer[2] as u32;
        let b3 = self.buffer[3] as u32;
        (b1 << 16) | (b2 << 8) | b3
    }

    /// Payload Length (excludes 40-byte header)
    pub fn payload_length(&self) -> u16 {
        u16::from_be_bytes([self.buffer[4], self.buffer[5]])
    }

    /// Next Header (protocol or extension header type)
    pub fn next_header(&self) -> u8 {
        self.buffer[6]
    }

    /// Hop Limit (equivalent to IPv4 TTL)
    pub fn hop_limit(&self) -> u8 {
        self.buffer[7]
    }

    /// Source address (128-bit)
    pub fn src_addr(&self) -> Ipv6Addr {
        let bytes: [u8; 16] = self.buffer[8..24].try_into().unwrap();
        Ipv6Addr::from(bytes)
    }

    /// Destination address (128-bit)
    pub fn dst_addr(&self) -> Ipv6Addr {
        let bytes: [u8; 16] = self.buffer[24..40].try_into().unwrap();
        Ipv6Addr::from(bytes)
    }

    /// Payload (everything after the 40-byte header)
    pub fn payload(&self) -> &[u8] {
        &self.buffer[HEADER_SIZE..]
    }
}

/// Builder for a 40-byte IPv6 fixed header.
///
/// Traffic Class and Flow Label are zero; IPv6 has no header checksum.
#[derive(Debug, Clone)]
pub struct Ipv6Builder {
    payload_length: u16,
    next_header: u8,
    hop_limit: u8,
    src_addr: Ipv6Addr,
    dst_addr: Ipv6Addr,
}

impl Ipv6Builder {
    pub fn new() -> Self {
        Self {
            payload_length: 0,
            next_header: 0,
            hop_limit: 64,
            src_addr: Ipv6Addr::UNSPECIFIED,
            dst_addr: Ipv6Addr::UNSPECIFIED,
        }
    }

    pub fn payload_length(mut self, len: u16) -> Self {
        self.payload_length = len;
        self
    }

    pub fn next_header(mut self, nh: u8) -> Self {
        self.next_header = nh;
        self
    }

    pub fn hop_limit(mut self, hl: u8) -> Self {
        self.hop_limit = hl;
        self
    }

    pub fn src_addr(mut self, addr: Ipv6Addr) -> Self {
        self.src_addr = addr;
        self
    }

    pub fn dst_addr(mut self, addr: Ipv6Addr) -> Self {
        self.dst_addr = addr;
        self
    }

    pub fn build(self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];

        // Version=6, Traffic Class=0, Flow Label=0
        header[0] = 0x60;
        header[4..6].copy_from_slice(&self.payload_length.to_be_bytes());
        header[6] = self.next_header;
        header[7] = self.hop_limit;
        header[8..24].copy_from_slice(&self.src_addr.octets());
        header[24..40].copy_from_slice(&self.dst_addr.octets());

        header
    }
}

impl Default for Ipv6Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte positions of the embedded IPv4 address for each permitted prefix
/// length. Octet 8 (the RFC 6052 `u` octet) is always skipped.
fn embedded_octet_slots(length: u8) -> Option<[usize; 4]> {
    match length {
        32 => Some([4, 5, 6, 7]),
        40 => Some([5, 6, 7, 9]),
        48 => Some([6, 7, 9, 10]),
        56 => Some([7, 9, 10, 11]),
        64 => Some([9, 10, 11, 12]),
        96 => Some([12, 13, 14, 15]),
        _ => None,
    }
}

/// IPv6 prefix (`address/length`), e.g. `64:ff9b::/96`.
///
/// Embedding and extraction follow RFC 6052; both require one of the
/// well-known prefix lengths 32, 40, 48, 56, 64 or 96.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Prefix {
    addr: Ipv6Addr,
    length: u8,
}

impl Ipv6Prefix {
    pub fn new(addr: Ipv6Addr, length: u8) -> Result<Self> {
        if length > 128 {
            return Err(Error::InvalidArgs(format!(
                "invalid IPv6 prefix length {length}"
            )));
        }
        Ok(Self { addr, length })
    }

    pub fn addr(&self) -> Ipv6Addr {
        self.addr
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    /// Whether this prefix can carry an embedded IPv4 address (RFC 6052
    /// permits lengths 32, 40, 48, 56, 64 and 96).
    pub fn is_valid_nat64(&self) -> bool {
        embedded_octet_slots(self.length).is_some()
    }

    /// Whether the first `length` bits of `addr` equal this prefix.
    pub fn matches(&self, addr: &Ipv6Addr) -> bool {
        let prefix = self.addr.octets();
        let addr = addr.octets();
        let full_bytes = (self.length / 8) as usize;
        let rem_bits = self.length % 8;

        if prefix[..full_bytes] != addr[..full_bytes] {
            return false;
        }
        if rem_bits > 0 {
            let mask = 0xFFu8 << (8 - rem_bits);
            if (prefix[full_bytes] ^ addr[full_bytes]) & mask != 0 {
                return false;
            }
        }
        true
    }

    /// Embeds an IPv4 address into this prefix (RFC 6052 §2.2 synthesis).
    /// Suffix bits and the `u` octet are zero.
    pub fn synthesize(&self, addr: Ipv4Addr) -> Result<Ipv6Addr> {
        let slots = embedded_octet_slots(self.length)
            .ok_or_else(|| Error::InvalidArgs(format!("prefix length {} cannot embed an IPv4 address", self.length)))?;

        let mut octets = self.addr.octets();
        // Zero everything past the prefix, then place the IPv4 octets.
        let full_bytes = (self.length / 8) as usize;
        for byte in octets.iter_mut().skip(full_bytes) {
            *byte = 0;
        }
        let v4 = addr.octets();
        for (slot, byte) in slots.iter().zip(v4.iter()) {
            octets[*slot] = *byte;
        }

        Ok(Ipv6Addr::from(octets))
    }

    /// Extracts the embedded IPv4 address from an address under this prefix
    /// (RFC 6052 §2.2 extraction). The caller is expected to have verified
    /// [`Ipv6Prefix::matches`] first.
    pub fn extract(&self, addr: &Ipv6Addr) -> Result<Ipv4Addr> {
        let slots = embedded_octet_slots(self.length)
            .ok_or_else(|| Error::InvalidArgs(format!("prefix length {} cannot embed an IPv4 address", self.length)))?;

        let octets = addr.octets();
        Ok(Ipv4Addr::new(
            octets[slots[0]],
            octets[slots[1]],
            octets[slots[2]],
            octets[slots[3]],
        ))
    }
}

impl FromStr for Ipv6Prefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, length) = s
            .split_once('/')
            .ok_or_else(|| Error::Parse(format!("invalid prefix {s:?}: missing '/'")))?;
        let addr: Ipv6Addr = addr
            .parse()
            .map_err(|_| Error::Parse(format!("invalid IPv6 address in prefix {s:?}")))?;
        let length: u8 = length
            .parse()
            .map_err(|_| Error::Parse(format!("invalid prefix length in {s:?}")))?;
        Ipv6Prefix::new(addr, length)
    }
}

impl fmt::Display for Ipv6Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.length)
    }
}
