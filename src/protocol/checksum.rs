//! Internet checksum arithmetic - RFC 1071, RFC 1624
//!
//! NAT64 meets checksums in three places: the IPv4 header checksum exists
//! on only one side of a translation, TCP/UDP checksums cover a
//! pseudo-header whose shape differs per family, and ICMP checksums are
//! recomputed outright because the type byte changes. The functions here
//! therefore work on open word accumulators, so a caller can combine a
//! pseudo-header sum with bytes read through the message buffer before
//! folding the result.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Sums a byte slice as big-endian 16-bit words into a checksum
/// accumulator.
pub fn sum_words(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;

    for i in (0..data.len()).step_by(2) {
        let word = if i + 1 < data.len() {
            u16::from_be_bytes([data[i], data[i + 1]])
        } else {
            // Pad with zero if odd length
            u16::from_be_bytes([data[i], 0])
        };
        sum = sum.wrapping_add(word as u32);
    }

    sum
}

/// Folds an accumulator's carries back into 16 bits.
pub fn fold(mut sum: u32) -> u16 {
    while sum > 0xFFFF {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    sum as u16
}

/// Final checksum over a contiguous region. The region's checksum field
/// must hold zero while computing.
pub fn checksum(data: &[u8]) -> u16 {
    !fold(sum_words(data))
}

/// Validates a region that carries its own checksum field: the sum over
/// the whole region, checksum included, must fold to 0xFFFF.
pub fn validate(data: &[u8]) -> bool {
    fold(sum_words(data)) == 0xFFFF
}

/// Pseudo-header contribution to a TCP/UDP checksum over IPv4 (RFC 793)
///
/// ```text
/// +--------+--------+--------+--------+
/// |          Source Address           |
/// +--------+--------+--------+--------+
/// |        Destination Address        |
/// +--------+--------+--------+--------+
/// |  Zero  |Protocol|     Length      |
/// +--------+--------+--------+--------+
/// ```
pub fn pseudo_header_sum_v4(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, protocol: u8, length: u16) -> u32 {
    let mut sum: u32 = 0;

    for chunk in src_ip.octets().chunks(2) {
        sum = sum.wrapping_add(u16::from_be_bytes([chunk[0], chunk[1]]) as u32);
    }
    for chunk in dst_ip.octets().chunks(2) {
        sum = sum.wrapping_add(u16::from_be_bytes([chunk[0], chunk[1]]) as u32);
    }
    sum = sum.wrapping_add(protocol as u32);
    sum.wrapping_add(length as u32)
}

/// Pseudo-header contribution to a TCP/UDP/ICMPv6 checksum over IPv6
/// (RFC 8200 §8.1)
pub fn pseudo_header_sum_v6(
    src_addr: &Ipv6Addr,
    dst_addr: &Ipv6Addr,
    next_header: u8,
    length: u32,
) -> u32 {
    let mut sum: u32 = 0;

    for chunk in src_addr.octets().chunks(2) {
        sum = sum.wrapping_add(u16::from_be_bytes([chunk[0], chunk[1]]) as u32);
    }
    for chunk in dst_addr.octets().chunks(2) {
        sum = sum.wrapping_add(u16::from_be_bytes([chunk[0], chunk[1]]) as u32);
    }
    // Upper-layer packet length is a 32-bit field in the IPv6 pseudo-header
    sum = sum.wrapping_add(length >> 16);
    sum = sum.wrapping_add(length & 0xFFFF);
    sum.wrapping_add(next_header as u32)
}

/// Incremental checksum update (RFC 1624)
///
/// Swaps one pseudo-header contribution of an existing transport checksum
/// for another. The transport bytes stay out of the computation entirely,
/// which is what keeps a family translation checksum-neutral: only the
/// pseudo-header difference enters the new value.
pub fn replace_pseudo_header_sum(old_checksum: u16, old_pseudo: u32, new_pseudo: u32) -> u16 {
    // Back out the folded old contribution, then add the new one
    let sum = (!old_checksum as u32)
        .wrapping_add(!fold(old_pseudo) as u32)
        .wrapping_add(fold(new_pseudo) as u32);
    !fold(sum)
}
