//! Header translation rules between the two IP families.
//!
//! Builds the replacement IP header for a translated packet. TCP and UDP
//! keep their protocol numbers across families; ICMP maps between protocol
//! 1 and ICMPv6 (58). Any other protocol is untranslatable and the packet
//! is dropped by the caller.
//!
//! TTL/hop-limit decrementing is the caller's job: outer headers are built
//! with an already-decremented value, embedded headers inside ICMP errors
//! are built with the original one.

use crate::protocol::ipv4::{Ipv4Builder, Protocol};
use crate::protocol::ipv6::{Ipv6Builder, NextHeader};
use crate::protocol::{ipv4, ipv6};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Maps an IPv6 next-header value to the IPv4 protocol it translates to.
pub(crate) fn protocol_for_next_header(next_header: u8) -> Option<u8> {
    match NextHeader::from_u8(next_header)? {
        NextHeader::Tcp => Some(Protocol::Tcp as u8),
        NextHeader::Udp => Some(Protocol::Udp as u8),
        NextHeader::Icmpv6 => Some(Protocol::Icmp as u8),
    }
}

/// Maps an IPv4 protocol value to the IPv6 next-header it translates to.
pub(crate) fn next_header_for_protocol(protocol: u8) -> Option<u8> {
    match Protocol::from_u8(protocol)? {
        Protocol::Tcp => Some(NextHeader::Tcp as u8),
        Protocol::Udp => Some(NextHeader::Udp as u8),
        Protocol::Icmp => Some(NextHeader::Icmpv6 as u8),
        // ICMPv6 inside an IPv4 packet is not translatable
        Protocol::Icmpv6 => None,
    }
}

/// Builds the IPv4 header replacing a translated IPv6 header.
///
/// DSCP/ECN, identification, flags and fragment offset are zero; the
/// header checksum is computed over the final field values.
pub(crate) fn build_ipv4(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    protocol: u8,
    ttl: u8,
    payload_len: usize,
) -> [u8; ipv4::HEADER_SIZE] {
    Ipv4Builder::new()
        .src_addr(src)
        .dst_addr(dst)
        .protocol(protocol)
        .ttl(ttl)
        .total_length((ipv4::HEADER_SIZE + payload_len) as u16)
        .build()
}

/// Builds the IPv6 header replacing a translated IPv4 header.
/// Traffic class and flow label are zero.
pub(crate) fn build_ipv6(
    src: Ipv6Addr,
    dst: Ipv6Addr,
    next_header: u8,
    hop_limit: u8,
    payload_len: usize,
) -> [u8; ipv6::HEADER_SIZE] {
    Ipv6Builder::new()
        .src_addr(src)
        .dst_addr(dst)
        .next_header(next_header)
        .hop_limit(hop_limit)
        .payload_length(payload_len as u16)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ipv4::Ipv4Header;
    use crate::protocol::ipv6::Ipv6Header;

    #[test]
    fn test_protocol_mapping_6to4() {
        assert_eq!(protocol_for_next_header(6), Some(6));
        assert_eq!(protocol_for_next_header(17), Some(17));
        assert_eq!(protocol_for_next_header(58), Some(1));
        // Extension headers and anything else are untranslatable
        assert_eq!(protocol_for_next_header(0), None);
        assert_eq!(protocol_for_next_header(44), None);
        assert_eq!(protocol_for_next_header(50), None);
    }

    #[test]
    fn test_protocol_mapping_4to6() {
        assert_eq!(next_header_for_protocol(6), Some(6));
        assert_eq!(next_header_for_protocol(17), Some(17));
        assert_eq!(next_header_for_protocol(1), Some(58));
        assert_eq!(next_header_for_protocol(58), None);
        assert_eq!(next_header_for_protocol(47), None);
    }

    #[test]
    fn test_build_ipv4() {
        let header = build_ipv4(
            Ipv4Addr::new(192, 0, 2, 1),
            Ipv4Addr::new(203, 0, 113, 5),
            Protocol::Udp as u8,
            63,
            18,
        );

        let hdr = Ipv4Header::parse(&header).unwrap();
        assert_eq!(hdr.total_length(), 38);
        assert_eq!(hdr.ttl(), 63);
        assert_eq!(hdr.identification(), 0);
        assert!(hdr.validate_checksum());
    }

    #[test]
    fn test_build_ipv6() {
        let src: Ipv6Addr = "64:ff9b::cb00:7105".parse().unwrap();
        let dst: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let header = build_ipv6(src, dst, NextHeader::Udp as u8, 63, 18);

        let hdr = Ipv6Header::parse(&header).unwrap();
        assert_eq!(hdr.src_addr(), src);
        assert_eq!(hdr.dst_addr(), dst);
        assert_eq!(hdr.payload_length(), 18);
        assert_eq!(hdr.hop_limit(), 63);
        assert_eq!(hdr.traffic_class(), 0);
        assert_eq!(hdr.flow_label(), 0);
    }
}
