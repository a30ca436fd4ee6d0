//! Protocol header parsing and construction
//!
//! Zero-copy header views over packet bytes, fixed-size header builders,
//! and the checksum arithmetic shared by all of them.

pub mod checksum;
pub mod icmp;
pub mod icmpv6;
pub mod ipv4;
pub mod ipv6;
pub mod tcp;
pub mod udp;
