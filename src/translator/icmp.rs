//! ICMPv4/ICMPv6 message translation.
//!
//! Echo messages only need their type byte remapped. Error messages carry
//! the offending IP datagram behind the ICMP header; that embedded packet
//! is translated to the other family as well, truncated to the leading
//! eight payload octets (RFC 792 keeps "64 bits of original data").
//!
//! From REQ-3 of RFC 5508, "NAT Behavioral Requirements for ICMP": an
//! error packet whose checksums fail to validate is silently dropped, and
//! the transport checksum of the embedded payload is never recomputed.

use super::header;
use super::table::AddressMapping;
use crate::message::Message;
use crate::protocol::checksum;
use crate::protocol::icmp::{self, dest_unreachable, parameter_problem, IcmpHeader, IcmpType};
use crate::protocol::icmpv6::{self, Icmpv6Type};
use crate::protocol::ipv4::Ipv4Header;
use crate::protocol::ipv6::{Ipv6Header, Ipv6Prefix};
use crate::protocol::{ipv4, ipv6};
use crate::{Error, Result};
use std::net::Ipv6Addr;
use tracing::debug;

/// Octets of the offending datagram's payload kept in a translated error.
pub const MIN_ICMP_ERROR_DATA: usize = 8;

/// Growth of the IP header when an embedded IPv6 packet replaces an
/// embedded IPv4 packet; also the shrink applied to a reported MTU.
const HEADER_SIZE_DELTA: u16 = (ipv6::HEADER_SIZE - ipv4::HEADER_SIZE) as u16;

const POINTER_UNMAPPED: u8 = 0xff;

/// IPv4 Parameter Problem pointer values mapped to the offset of the
/// corresponding IPv6 header field. 0xff marks fields with no counterpart.
const POINTER_MAP: [u8; 20] = [
    0, 1, 4, 4, 0xff, 0xff, 0xff, 0xff, 7, 6, 0xff, 0xff, 8, 8, 8, 8, 24, 24, 24, 24,
];

/// Translates an inbound ICMPv4 message (the message starts at the ICMP
/// header) into ICMPv6 and recomputes its checksum over the IPv6
/// pseudo-header formed by the new outer addresses.
pub(crate) fn translate_icmp4(
    msg: &mut Message,
    mapping: &AddressMapping,
    prefix: &Ipv6Prefix,
    outer_src: &Ipv6Addr,
    outer_dst: &Ipv6Addr,
) -> Result<()> {
    let mut head = [0u8; icmp::HEADER_SIZE];
    if msg.read_bytes(0, &mut head) != icmp::HEADER_SIZE {
        return Err(Error::Parse("ICMP message too short".into()));
    }
    let icmp4 = IcmpHeader::from_bytes(head);

    let (icmp6, is_error) = map_icmp4_header(&icmp4)?;

    if is_error {
        if !checksum::validate(msg.as_slice()) {
            return Err(Error::Parse("ICMP error message checksum mismatch".into()));
        }
        translate_embedded_4to6(msg, mapping, prefix)?;
        msg.prepend_bytes(icmp6.as_bytes())?;
    } else {
        msg.write_bytes(0, icmp6.as_bytes())?;
    }

    // ICMPv6 checksums cover the IPv6 pseudo-header.
    msg.write_bytes(2, &[0, 0])?;
    let sum = checksum::pseudo_header_sum_v6(
        outer_src,
        outer_dst,
        ipv6::NextHeader::Icmpv6 as u8,
        msg.len() as u32,
    ) + msg.sum_bytes(0, msg.len());
    msg.write_bytes(2, &(!checksum::fold(sum)).to_be_bytes())
}

/// Translates an outbound ICMPv6 message (the message starts at the ICMP
/// header) into ICMPv4 and recomputes its checksum (no pseudo-header).
pub(crate) fn translate_icmp6(
    msg: &mut Message,
    mapping: &AddressMapping,
    prefix: &Ipv6Prefix,
) -> Result<()> {
    let mut head = [0u8; icmp::HEADER_SIZE];
    if msg.read_bytes(0, &mut head) != icmp::HEADER_SIZE {
        return Err(Error::Parse("ICMPv6 message too short".into()));
    }
    let icmp6 = IcmpHeader::from_bytes(head);

    let (icmp4, is_error) = map_icmp6_header(&icmp6)?;

    if is_error {
        translate_embedded_6to4(msg, mapping, prefix)?;
        msg.prepend_bytes(icmp4.as_bytes())?;
    } else {
        msg.write_bytes(0, icmp4.as_bytes())?;
    }

    msg.write_bytes(2, &[0, 0])?;
    let sum = msg.sum_bytes(0, msg.len());
    msg.write_bytes(2, &(!checksum::fold(sum)).to_be_bytes())
}

/// Maps an ICMPv4 header to its ICMPv6 counterpart. Returns the rewritten
/// header and whether it is an error message carrying an embedded packet.
fn map_icmp4_header(icmp4: &IcmpHeader) -> Result<(IcmpHeader, bool)> {
    let mut out = *icmp4;

    match IcmpType::from_u8(icmp4.msg_type()) {
        Some(IcmpType::EchoRequest) => {
            out.set_type(Icmpv6Type::EchoRequest as u8);
            Ok((out, false))
        }
        Some(IcmpType::EchoReply) => {
            out.set_type(Icmpv6Type::EchoReply as u8);
            Ok((out, false))
        }
        Some(IcmpType::DestinationUnreachable) => {
            map_dest_unreachable_4to6(icmp4, &mut out)?;
            Ok((out, true))
        }
        Some(IcmpType::TimeExceeded) => {
            out.set_type(Icmpv6Type::TimeExceeded as u8);
            out.set_rest_of_header([0; 4]);
            Ok((out, true))
        }
        Some(IcmpType::ParameterProblem) => {
            map_parameter_problem_4to6(icmp4, &mut out)?;
            Ok((out, true))
        }
        None => Err(Error::Parse(format!(
            "untranslatable ICMP type {}",
            icmp4.msg_type()
        ))),
    }
}

fn map_dest_unreachable_4to6(icmp4: &IcmpHeader, out: &mut IcmpHeader) -> Result<()> {
    match icmp4.code() {
        dest_unreachable::PROTOCOL_UNREACHABLE => {
            // The offending protocol sits in the IPv6 next-header field.
            out.set_type(Icmpv6Type::ParameterProblem as u8);
            out.set_code(icmpv6::parameter_problem::UNRECOGNIZED_NEXT_HEADER);
            out.set_rest_of_header(icmpv6::NEXT_HEADER_FIELD_OFFSET.to_be_bytes());
        }
        dest_unreachable::FRAGMENTATION_NEEDED => {
            let rest = icmp4.rest_of_header();
            let mtu = u16::from_be_bytes([rest[2], rest[3]]);
            // Account for the larger IPv6 header; the result may fall below
            // the IPv6 minimum MTU.
            let mtu = u32::from(mtu.saturating_sub(HEADER_SIZE_DELTA));
            out.set_type(Icmpv6Type::PacketTooBig as u8);
            out.set_code(0);
            out.set_rest_of_header(mtu.to_be_bytes());
        }
        dest_unreachable::NET_UNREACHABLE
        | dest_unreachable::HOST_UNREACHABLE
        | dest_unreachable::SOURCE_ROUTE_FAILED
        | dest_unreachable::NETWORK_UNKNOWN
        | dest_unreachable::HOST_UNKNOWN
        | dest_unreachable::SOURCE_HOST_ISOLATED
        | dest_unreachable::NET_UNREACHABLE_FOR_TOS
        | dest_unreachable::HOST_UNREACHABLE_FOR_TOS => {
            out.set_type(Icmpv6Type::DestinationUnreachable as u8);
            out.set_code(icmpv6::dest_unreachable::NO_ROUTE);
            out.set_rest_of_header([0; 4]);
        }
        dest_unreachable::PORT_UNREACHABLE => {
            out.set_type(Icmpv6Type::DestinationUnreachable as u8);
            out.set_code(icmpv6::dest_unreachable::PORT_UNREACHABLE);
            out.set_rest_of_header([0; 4]);
        }
        dest_unreachable::NET_PROHIBITED
        | dest_unreachable::HOST_PROHIBITED
        | dest_unreachable::COMMUNICATION_PROHIBITED
        | dest_unreachable::PRECEDENCE_CUTOFF => {
            out.set_type(Icmpv6Type::DestinationUnreachable as u8);
            out.set_code(icmpv6::dest_unreachable::ADMIN_PROHIBITED);
            out.set_rest_of_header([0; 4]);
        }
        code => {
            return Err(Error::Parse(format!(
                "untranslatable destination unreachable code {code}"
            )));
        }
    }
    Ok(())
}

fn map_parameter_problem_4to6(icmp4: &IcmpHeader, out: &mut IcmpHeader) -> Result<()> {
    match icmp4.code() {
        parameter_problem::POINTER | parameter_problem::BAD_LENGTH => {}
        code => {
            return Err(Error::Parse(format!(
                "untranslatable parameter problem code {code}"
            )));
        }
    }

    let pointer = icmp4.rest_of_header()[0] as usize;
    let mapped = POINTER_MAP
        .get(pointer)
        .copied()
        .filter(|p| *p != POINTER_UNMAPPED)
        .ok_or_else(|| {
            Error::Parse(format!("parameter problem pointer {pointer} has no IPv6 counterpart"))
        })?;

    out.set_type(Icmpv6Type::ParameterProblem as u8);
    out.set_code(icmpv6::parameter_problem::ERRONEOUS_HEADER);
    out.set_rest_of_header((mapped as u32).to_be_bytes());
    Ok(())
}

/// Maps an ICMPv6 header to its ICMPv4 counterpart.
fn map_icmp6_header(icmp6: &IcmpHeader) -> Result<(IcmpHeader, bool)> {
    let mut out = *icmp6;

    match Icmpv6Type::from_u8(icmp6.msg_type()) {
        Some(Icmpv6Type::EchoRequest) => {
            out.set_type(IcmpType::EchoRequest as u8);
            Ok((out, false))
        }
        Some(Icmpv6Type::EchoReply) => {
            out.set_type(IcmpType::EchoReply as u8);
            Ok((out, false))
        }
        Some(Icmpv6Type::DestinationUnreachable) => {
            let code = match icmp6.code() {
                icmpv6::dest_unreachable::NO_ROUTE => dest_unreachable::HOST_UNREACHABLE,
                icmpv6::dest_unreachable::ADMIN_PROHIBITED => dest_unreachable::HOST_PROHIBITED,
                icmpv6::dest_unreachable::BEYOND_SCOPE => dest_unreachable::HOST_UNREACHABLE,
                icmpv6::dest_unreachable::ADDRESS_UNREACHABLE => {
                    dest_unreachable::HOST_UNREACHABLE
                }
                icmpv6::dest_unreachable::PORT_UNREACHABLE => dest_unreachable::PORT_UNREACHABLE,
                code => {
                    return Err(Error::Parse(format!(
                        "untranslatable destination unreachable code {code}"
                    )));
                }
            };
            out.set_type(IcmpType::DestinationUnreachable as u8);
            out.set_code(code);
            out.set_rest_of_header([0; 4]);
            Ok((out, true))
        }
        _ => Err(Error::Parse(format!(
            "untranslatable ICMPv6 type {}",
            icmp6.msg_type()
        ))),
    }
}

/// Rewrites the embedded IPv4 packet of an error message into IPv6. On
/// entry the message is `[ICMP header | inner IPv4 header | data]`; on exit
/// it is `[inner IPv6 header | 8 data octets]`, ready for the translated
/// ICMP header to be prepended.
fn translate_embedded_4to6(
    msg: &mut Message,
    mapping: &AddressMapping,
    prefix: &Ipv6Prefix,
) -> Result<()> {
    let mut inner = [0u8; ipv4::HEADER_SIZE];
    if msg.read_bytes(icmp::HEADER_SIZE, &mut inner) != ipv4::HEADER_SIZE {
        return Err(Error::Parse("embedded packet too short".into()));
    }
    let inner_hdr = Ipv4Header::parse(&inner)?;
    if inner_hdr.ihl() != 5 {
        return Err(Error::Parse("embedded IPv4 header carries options".into()));
    }
    if !inner_hdr.validate_checksum() {
        return Err(Error::Parse("embedded IPv4 header checksum mismatch".into()));
    }
    if inner_hdr.src_addr() != mapping.ip4 {
        debug!(
            "embedded source {} does not match mapping {}",
            inner_hdr.src_addr(),
            mapping.ip4
        );
        return Err(Error::Parse("embedded packet source outside mapping".into()));
    }

    let next_header = header::next_header_for_protocol(inner_hdr.protocol())
        .ok_or_else(|| Error::Parse("untranslatable embedded protocol".into()))?;

    let mut data = [0u8; MIN_ICMP_ERROR_DATA];
    if msg.read_bytes(icmp::HEADER_SIZE + ipv4::HEADER_SIZE, &mut data) != MIN_ICMP_ERROR_DATA {
        return Err(Error::Parse("embedded packet payload too short".into()));
    }

    let inner6 = header::build_ipv6(
        mapping.ip6,
        prefix.synthesize(inner_hdr.dst_addr())?,
        next_header,
        inner_hdr.ttl(),
        MIN_ICMP_ERROR_DATA,
    );

    msg.remove_header(icmp::HEADER_SIZE + ipv4::HEADER_SIZE);
    msg.set_len(MIN_ICMP_ERROR_DATA)?;
    msg.write_bytes(0, &data)?;
    msg.prepend_bytes(&inner6)
}

/// Rewrites the embedded IPv6 packet of an error message into IPv4. On
/// entry the message is `[ICMP header | inner IPv6 header | data]`; on exit
/// it is `[inner IPv4 header | 8 data octets]`.
fn translate_embedded_6to4(
    msg: &mut Message,
    mapping: &AddressMapping,
    prefix: &Ipv6Prefix,
) -> Result<()> {
    let mut inner = [0u8; ipv6::HEADER_SIZE];
    if msg.read_bytes(icmp::HEADER_SIZE, &mut inner) != ipv6::HEADER_SIZE {
        return Err(Error::Parse("embedded packet too short".into()));
    }
    let inner_hdr = Ipv6Header::parse(&inner)?;
    if inner_hdr.dst_addr() != mapping.ip6 {
        debug!(
            "embedded destination {} does not match mapping {}",
            inner_hdr.dst_addr(),
            mapping.ip6
        );
        return Err(Error::Parse(
            "embedded packet destination outside mapping".into(),
        ));
    }
    if !prefix.matches(&inner_hdr.src_addr()) {
        return Err(Error::Parse(
            "embedded packet source outside the NAT64 prefix".into(),
        ));
    }

    let protocol = header::protocol_for_next_header(inner_hdr.next_header())
        .ok_or_else(|| Error::Parse("untranslatable embedded next header".into()))?;

    let mut data = [0u8; MIN_ICMP_ERROR_DATA];
    if msg.read_bytes(icmp::HEADER_SIZE + ipv6::HEADER_SIZE, &mut data) != MIN_ICMP_ERROR_DATA {
        return Err(Error::Parse("embedded packet payload too short".into()));
    }

    let inner4 = header::build_ipv4(
        prefix.extract(&inner_hdr.src_addr())?,
        mapping.ip4,
        protocol,
        inner_hdr.hop_limit(),
        MIN_ICMP_ERROR_DATA,
    );

    msg.remove_header(icmp::HEADER_SIZE + ipv6::HEADER_SIZE);
    msg.set_len(MIN_ICMP_ERROR_DATA)?;
    msg.write_bytes(0, &data)?;
    msg.prepend_bytes(&inner4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ipv4::Ipv4Builder;
    use crate::protocol::ipv6::Ipv6Builder;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn mapping() -> AddressMapping {
        AddressMapping {
            ip6: "2001:db8::1".parse().unwrap(),
            ip4: Ipv4Addr::new(192, 0, 2, 1),
            expiry_ms: 0,
        }
    }

    fn prefix() -> Ipv6Prefix {
        "64:ff9b::/96".parse().unwrap()
    }

    fn icmp4_bytes(msg_type: u8, code: u8, rest: [u8; 4], body: &[u8]) -> Vec<u8> {
        let mut packet = vec![msg_type, code, 0, 0, rest[0], rest[1], rest[2], rest[3]];
        packet.extend_from_slice(body);
        let sum = checksum::checksum(&packet);
        packet[2..4].copy_from_slice(&sum.to_be_bytes());
        packet
    }

    /// An embedded IPv4 UDP packet as it would appear inside an inbound
    /// ICMPv4 error: sourced from the mapping's pool address.
    fn embedded_v4_udp() -> Vec<u8> {
        let header = Ipv4Builder::new()
            .src_addr(Ipv4Addr::new(192, 0, 2, 1))
            .dst_addr(Ipv4Addr::new(203, 0, 113, 5))
            .protocol(17)
            .ttl(63)
            .total_length(30)
            .build();
        let mut packet = header.to_vec();
        // Leading 8 octets of the original UDP datagram
        packet.extend_from_slice(&[0xab, 0xcd, 0x12, 0x34, 0x00, 0x0a, 0xbe, 0xef]);
        packet
    }

    #[test]
    fn test_echo_reply_4to6() {
        let packet = icmp4_bytes(0, 0, [0x12, 0x34, 0x00, 0x01], b"payload");
        let mut msg = Message::with_headroom(&packet, 40);

        let src6: Ipv6Addr = "64:ff9b::cb00:7105".parse().unwrap();
        let dst6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        translate_icmp4(&mut msg, &mapping(), &prefix(), &src6, &dst6).unwrap();

        let out = msg.as_slice();
        assert_eq!(out[0], 129);
        assert_eq!(out[1], 0);
        // Identifier/sequence and payload are untouched
        assert_eq!(&out[4..8], &[0x12, 0x34, 0x00, 0x01]);
        assert_eq!(&out[8..], b"payload");

        // Checksum validates over the pseudo-header
        let sum = checksum::pseudo_header_sum_v6(&src6, &dst6, 58, out.len() as u32)
            + checksum::sum_words(out);
        assert_eq!(checksum::fold(sum), 0xFFFF);
    }

    #[test]
    fn test_echo_request_6to4() {
        let mut packet = vec![128u8, 0, 0, 0, 0x56, 0x78, 0x00, 0x02];
        packet.extend_from_slice(b"ping");
        let mut msg = Message::with_headroom(&packet, 40);

        translate_icmp6(&mut msg, &mapping(), &prefix()).unwrap();

        let out = msg.as_slice();
        assert_eq!(out[0], 8);
        assert_eq!(&out[4..8], &[0x56, 0x78, 0x00, 0x02]);
        assert_eq!(&out[8..], b"ping");
        assert!(checksum::validate(out));
    }

    #[test]
    fn test_port_unreachable_4to6_rewrites_embedded() {
        let embedded = embedded_v4_udp();
        let packet = icmp4_bytes(3, 3, [0; 4], &embedded);
        let mut msg = Message::with_headroom(&packet, 60);

        let src6: Ipv6Addr = "64:ff9b::cb00:7105".parse().unwrap();
        let dst6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        translate_icmp4(&mut msg, &mapping(), &prefix(), &src6, &dst6).unwrap();

        let out = msg.as_slice().to_vec();
        assert_eq!(out.len(), icmp::HEADER_SIZE + ipv6::HEADER_SIZE + MIN_ICMP_ERROR_DATA);
        assert_eq!(out[0], 1); // destination unreachable
        assert_eq!(out[1], 4); // port unreachable

        let inner = Ipv6Header::parse(&out[8..]).unwrap();
        assert_eq!(inner.src_addr(), "2001:db8::1".parse::<Ipv6Addr>().unwrap());
        assert_eq!(
            inner.dst_addr(),
            "64:ff9b::203.0.113.5".parse::<Ipv6Addr>().unwrap()
        );
        assert_eq!(inner.next_header(), 17);
        assert_eq!(inner.hop_limit(), 63); // embedded TTL is not decremented
        assert_eq!(inner.payload_length(), 8);

        // Embedded transport bytes are carried over verbatim
        assert_eq!(&out[48..], &[0xab, 0xcd, 0x12, 0x34, 0x00, 0x0a, 0xbe, 0xef]);

        let sum = checksum::pseudo_header_sum_v6(&src6, &dst6, 58, out.len() as u32)
            + checksum::sum_words(&out);
        assert_eq!(checksum::fold(sum), 0xFFFF);
    }

    #[test]
    fn test_embedded_source_mismatch_drops() {
        let mut embedded = embedded_v4_udp();
        // Change the embedded source away from the mapping's address and
        // patch the inner checksum so only the address check can fail.
        embedded[15] = 9;
        embedded[10] = 0;
        embedded[11] = 0;
        let sum = checksum::checksum(&embedded[..20]);
        embedded[10..12].copy_from_slice(&sum.to_be_bytes());

        let packet = icmp4_bytes(3, 3, [0; 4], &embedded);
        let mut msg = Message::with_headroom(&packet, 60);

        let src6: Ipv6Addr = "64:ff9b::cb00:7105".parse().unwrap();
        let dst6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        assert!(translate_icmp4(&mut msg, &mapping(), &prefix(), &src6, &dst6).is_err());
    }

    #[test]
    fn test_embedded_bad_checksum_drops() {
        let mut embedded = embedded_v4_udp();
        embedded[10] ^= 0xff;

        let packet = icmp4_bytes(3, 3, [0; 4], &embedded);
        let mut msg = Message::with_headroom(&packet, 60);

        let src6: Ipv6Addr = "64:ff9b::1".parse().unwrap();
        let dst6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        assert!(translate_icmp4(&mut msg, &mapping(), &prefix(), &src6, &dst6).is_err());
    }

    #[test]
    fn test_outer_checksum_mismatch_drops() {
        let embedded = embedded_v4_udp();
        let mut packet = icmp4_bytes(3, 3, [0; 4], &embedded);
        packet[2] ^= 0xff;
        let mut msg = Message::with_headroom(&packet, 60);

        let src6: Ipv6Addr = "64:ff9b::1".parse().unwrap();
        let dst6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        assert!(translate_icmp4(&mut msg, &mapping(), &prefix(), &src6, &dst6).is_err());
    }

    #[test]
    fn test_fragmentation_needed_becomes_packet_too_big() {
        let embedded = embedded_v4_udp();
        // Next-hop MTU 1500 in the low half of rest-of-header
        let packet = icmp4_bytes(3, 4, [0, 0, 0x05, 0xdc], &embedded);
        let mut msg = Message::with_headroom(&packet, 60);

        let src6: Ipv6Addr = "64:ff9b::1".parse().unwrap();
        let dst6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        translate_icmp4(&mut msg, &mapping(), &prefix(), &src6, &dst6).unwrap();

        let out = msg.as_slice();
        assert_eq!(out[0], 2); // packet too big
        assert_eq!(out[1], 0);
        assert_eq!(u32::from_be_bytes([out[4], out[5], out[6], out[7]]), 1480);
    }

    #[test]
    fn test_protocol_unreachable_becomes_parameter_problem() {
        let embedded = embedded_v4_udp();
        let packet = icmp4_bytes(3, 2, [0; 4], &embedded);
        let mut msg = Message::with_headroom(&packet, 60);

        let src6: Ipv6Addr = "64:ff9b::1".parse().unwrap();
        let dst6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        translate_icmp4(&mut msg, &mapping(), &prefix(), &src6, &dst6).unwrap();

        let out = msg.as_slice();
        assert_eq!(out[0], 4);
        assert_eq!(out[1], 1);
        assert_eq!(u32::from_be_bytes([out[4], out[5], out[6], out[7]]), 6);
    }

    #[test]
    fn test_host_precedence_violation_drops() {
        let embedded = embedded_v4_udp();
        let packet = icmp4_bytes(3, 14, [0; 4], &embedded);
        let mut msg = Message::with_headroom(&packet, 60);

        let src6: Ipv6Addr = "64:ff9b::1".parse().unwrap();
        let dst6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        assert!(translate_icmp4(&mut msg, &mapping(), &prefix(), &src6, &dst6).is_err());
    }

    #[test]
    fn test_parameter_problem_pointer_map() {
        let cases: [(u8, Option<u32>); 21] = [
            (0, Some(0)),
            (1, Some(1)),
            (2, Some(4)),
            (3, Some(4)),
            (4, None),
            (5, None),
            (6, None),
            (7, None),
            (8, Some(7)),
            (9, Some(6)),
            (10, None),
            (11, None),
            (12, Some(8)),
            (13, Some(8)),
            (14, Some(8)),
            (15, Some(8)),
            (16, Some(24)),
            (17, Some(24)),
            (18, Some(24)),
            (19, Some(24)),
            // Pointers past the IPv4 header never translate
            (25, None),
        ];

        for (pointer, expected) in cases {
            let embedded = embedded_v4_udp();
            let packet = icmp4_bytes(12, 0, [pointer, 0, 0, 0], &embedded);
            let mut msg = Message::with_headroom(&packet, 60);

            let src6: Ipv6Addr = "64:ff9b::1".parse().unwrap();
            let dst6: Ipv6Addr = "2001:db8::1".parse().unwrap();
            let result = translate_icmp4(&mut msg, &mapping(), &prefix(), &src6, &dst6);

            match expected {
                Some(offset) => {
                    result.unwrap();
                    let out = msg.as_slice();
                    assert_eq!(out[0], 4, "pointer {pointer}");
                    assert_eq!(out[1], 0, "pointer {pointer}");
                    assert_eq!(
                        u32::from_be_bytes([out[4], out[5], out[6], out[7]]),
                        offset,
                        "pointer {pointer}"
                    );
                }
                None => assert!(result.is_err(), "pointer {pointer}"),
            }
        }
    }

    #[test]
    fn test_dest_unreachable_6to4_rewrites_embedded() {
        // Embedded IPv6 packet: the datagram the remote host originally
        // received, destined to the tracked inside host.
        let inner = Ipv6Builder::new()
            .src_addr("64:ff9b::203.0.113.5".parse().unwrap())
            .dst_addr("2001:db8::1".parse().unwrap())
            .next_header(17)
            .hop_limit(62)
            .payload_length(10)
            .build();

        let mut packet = vec![1u8, 4, 0, 0, 0, 0, 0, 0];
        packet.extend_from_slice(&inner);
        packet.extend_from_slice(&[0xab, 0xcd, 0x12, 0x34, 0x00, 0x0a, 0xbe, 0xef, 0xff, 0xff]);
        let mut msg = Message::with_headroom(&packet, 40);

        translate_icmp6(&mut msg, &mapping(), &prefix()).unwrap();

        let out = msg.as_slice().to_vec();
        assert_eq!(out.len(), icmp::HEADER_SIZE + ipv4::HEADER_SIZE + MIN_ICMP_ERROR_DATA);
        assert_eq!(out[0], 3);
        assert_eq!(out[1], 3); // port unreachable

        let inner4 = Ipv4Header::parse(&out[8..]).unwrap();
        assert_eq!(inner4.src_addr(), Ipv4Addr::new(203, 0, 113, 5));
        assert_eq!(inner4.dst_addr(), Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(inner4.protocol(), 17);
        assert_eq!(inner4.ttl(), 62);
        assert_eq!(inner4.total_length(), 28);
        assert!(inner4.validate_checksum());

        // Only the first eight payload octets survive
        assert_eq!(&out[28..], &[0xab, 0xcd, 0x12, 0x34, 0x00, 0x0a, 0xbe, 0xef]);
        assert!(checksum::validate(&out));
    }

    #[test]
    fn test_embedded_destination_mismatch_drops() {
        let inner = Ipv6Builder::new()
            .src_addr("64:ff9b::203.0.113.5".parse().unwrap())
            .dst_addr("2001:db8::99".parse().unwrap())
            .next_header(17)
            .hop_limit(62)
            .payload_length(10)
            .build();

        let mut packet = vec![1u8, 4, 0, 0, 0, 0, 0, 0];
        packet.extend_from_slice(&inner);
        packet.extend_from_slice(&[0u8; 8]);
        let mut msg = Message::with_headroom(&packet, 40);

        assert!(translate_icmp6(&mut msg, &mapping(), &prefix()).is_err());
    }

    #[test]
    fn test_icmpv6_time_exceeded_drops() {
        let packet = vec![3u8, 0, 0, 0, 0, 0, 0, 0];
        let mut msg = Message::with_headroom(&packet, 40);
        assert!(translate_icmp6(&mut msg, &mapping(), &prefix()).is_err());
    }
}
