//! ICMP (Internet Control Message Protocol) - RFC 792
//!
//! Types and codes relevant to NAT64 translation, plus the fixed 8-byte
//! message header shared by ICMPv4 and ICMPv6.

use crate::{Error, Result};

/// Fixed ICMP header size: type, code, checksum, rest-of-header.
pub const HEADER_SIZE: usize = 8;

/// ICMP message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IcmpType {
    EchoReply = 0,
    DestinationUnreachable = 3,
    EchoRequest = 8,
    TimeExceeded = 11,
    ParameterProblem = 12,
}

impl IcmpType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(IcmpType::EchoReply),
            3 => Some(IcmpType::DestinationUnreachable),
            8 => Some(IcmpType::EchoRequest),
            11 => Some(IcmpType::TimeExceeded),
            12 => Some(IcmpType::ParameterProblem),
            _ => None,
        }
    }
}

/// Destination Unreachable codes (RFC 792, RFC 1812)
pub mod dest_unreachable {
    pub const NET_UNREACHABLE: u8 = 0;
    pub const HOST_UNREACHABLE: u8 = 1;
    pub const PROTOCOL_UNREACHABLE: u8 = 2;
    pub const PORT_UNREACHABLE: u8 = 3;
    pub const FRAGMENTATION_NEEDED: u8 = 4;
    pub const SOURCE_ROUTE_FAILED: u8 = 5;
    pub const NETWORK_UNKNOWN: u8 = 6;
    pub const HOST_UNKNOWN: u8 = 7;
    pub const SOURCE_HOST_ISOLATED: u8 = 8;
    pub const NET_PROHIBITED: u8 = 9;
    pub const HOST_PROHIBITED: u8 = 10;
    pub const NET_UNREACHABLE_FOR_TOS: u8 = 11;
    pub const HOST_UNREACHABLE_FOR_TOS: u8 = 12;
    pub const COMMUNICATION_PROHIBITED: u8 = 13;
    pub const HOST_PRECEDENCE_VIOLATION: u8 = 14;
    pub const PRECEDENCE_CUTOFF: u8 = 15;
}

/// Parameter Problem codes (RFC 792, RFC 1812)
pub mod parameter_problem {
    /// Pointer indicates the error
    pub const POINTER: u8 = 0;
    /// A required option is missing
    pub const MISSING_OPTION: u8 = 1;
    /// Bad length
    pub const BAD_LENGTH: u8 = 2;
}

/// Owned copy of the fixed 8-byte ICMP header.
///
/// Both ICMP families share this layout; the translator reads the header
/// out of a message, rewrites type/code/rest-of-header, and writes it back
/// or prepends it in front of a rebuilt body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    bytes: [u8; HEADER_SIZE],
}

impl IcmpHeader {
    pub fn new(msg_type: u8, code: u8) -> Self {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0] = msg_type;
        bytes[1] = code;
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            return Err(Error::Parse("ICMP header too short".into()));
        }
        let mut bytes = [0u8; HEADER_SIZE];
        bytes.copy_from_slice(&buffer[..HEADER_SIZE]);
        Ok(Self { bytes })
    }

    pub fn msg_type(&self) -> u8 {
        self.bytes[0]
    }

    pub fn code(&self) -> u8 {
        self.bytes[1]
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.bytes[2], self.bytes[3]])
    }

    /// Rest-of-header: identifier/sequence for echo, MTU for packet too
    /// big, pointer for parameter problem, unused otherwise.
    pub fn rest_of_header(&self) -> [u8; 4] {
        [self.bytes[4], self.bytes[5], self.bytes[6], self.bytes[7]]
    }

    pub fn set_type(&mut self, msg_type: u8) {
        self.bytes[0] = msg_type;
    }

    pub fn set_code(&mut self, code: u8) {
        self.bytes[1] = code;
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        self.bytes[2..4].copy_from_slice(&checksum.to_be_bytes());
    }

    pub fn set_rest_of_header(&mut self, rest: [u8; 4]) {
        self.bytes[4..8].copy_from_slice(&rest);
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.bytes
    }
}
