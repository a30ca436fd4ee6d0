//! Stateful NAT64 translation engine.
//!
//! [`Nat64Translator`] rewrites outgoing IPv6 packets aimed at the
//! configured NAT64 prefix into IPv4 packets sourced from a pool derived
//! from the configured CIDR, and rewrites returning IPv4 packets back into
//! IPv6 using the mapping table. All rewriting happens in place on the
//! caller's [`Message`]; the translator performs no allocation and no I/O.
//!
//! Calls are synchronous and run to completion; the caller serializes
//! packet handling and configuration changes.

pub mod clock;
pub mod pool;
pub mod table;

mod header;
mod icmp;

pub use clock::{ManualClock, MonotonicClock, UptimeClock};
pub use icmp::MIN_ICMP_ERROR_DATA;
pub use pool::AddressPool;
pub use table::{AddressMapping, MappingTable, MAPPING_IDLE_TIMEOUT_SECS};

use crate::message::Message;
use crate::protocol::checksum;
use crate::protocol::ipv4::{Ipv4Cidr, Ipv4Header, Protocol};
use crate::protocol::ipv6::{Ipv6Header, Ipv6Prefix};
use crate::protocol::{ipv4, ipv6, tcp, udp};
use crate::telemetry::Nat64Metrics;
use crate::{Error, Result};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Capacity of the mapping arena and the address pool.
pub const ADDRESS_MAPPING_POOL_SIZE: usize = 254;

/// What the caller should do with a handled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Continue forwarding the message. It has either been translated in
    /// place or intentionally left untouched (passthrough).
    Forward,
    /// Discard the message silently.
    Drop,
    /// Reply with an ICMP error. Reserved; current rules never produce it.
    ReplyIcmp,
}

/// NAT64 translator instance.
///
/// Generic over the clock (so tests can drive expiry deterministically) and
/// the mapping capacity. `Nat64Translator::new()` uses the uptime clock and
/// the default capacity.
#[derive(Debug)]
pub struct Nat64Translator<C: MonotonicClock = UptimeClock, const N: usize = ADDRESS_MAPPING_POOL_SIZE>
{
    table: MappingTable<N>,
    pool: AddressPool<N>,
    nat64_prefix: Option<Ipv6Prefix>,
    ip4_cidr: Option<Ipv4Cidr>,
    enabled: bool,
    clock: C,
    metrics: Nat64Metrics,
}

impl<const N: usize> Nat64Translator<UptimeClock, N> {
    pub fn new() -> Self {
        Self::with_clock(UptimeClock::new())
    }
}

impl Default for Nat64Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: MonotonicClock, const N: usize> Nat64Translator<C, N> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            table: MappingTable::new(),
            pool: AddressPool::new(),
            nat64_prefix: None,
            ip4_cidr: None,
            enabled: false,
            clock,
            metrics: Nat64Metrics::new(),
        }
    }

    /// Translates an outgoing IPv6 message into IPv4.
    ///
    /// The message is left untouched when the translator is disabled, the
    /// destination is outside the NAT64 prefix, or no CIDR is installed;
    /// the returned verdict is still [`Verdict::Forward`] so the caller
    /// keeps forwarding natively.
    pub fn handle_outgoing(&mut self, msg: &mut Message) -> Verdict {
        if !self.enabled {
            self.metrics.packets_passthrough.inc();
            return Verdict::Forward;
        }

        let (src6, dst6, next_header, hop_limit, payload_length) =
            match Ipv6Header::parse(msg.as_slice()) {
                Ok(hdr) => (
                    hdr.src_addr(),
                    hdr.dst_addr(),
                    hdr.next_header(),
                    hdr.hop_limit(),
                    hdr.payload_length(),
                ),
                Err(_) => {
                    warn!("outgoing packet is not a valid IPv6 packet, drop");
                    return self.drop_packet();
                }
            };
        if ipv6::HEADER_SIZE + payload_length as usize != msg.len() {
            warn!("outgoing packet length disagrees with its payload length, drop");
            return self.drop_packet();
        }

        let Some(prefix) = self.nat64_prefix.filter(Ipv6Prefix::is_valid_nat64) else {
            self.metrics.packets_passthrough.inc();
            return Verdict::Forward;
        };
        if !prefix.matches(&dst6) {
            // Not aimed at the NAT64 network; forward natively.
            self.metrics.packets_passthrough.inc();
            return Verdict::Forward;
        }

        if self.ip4_cidr.is_none() {
            debug!("no IPv4 CIDR configured, forwarding for external translation");
            self.metrics.packets_passthrough.inc();
            return Verdict::Forward;
        }

        if hop_limit <= 1 {
            debug!("outgoing packet hop limit reached, drop");
            return self.drop_packet();
        }
        let ttl = hop_limit - 1;

        let now = self.clock.now_ms();
        let existed = self.table.find_by_ip6(&src6).is_some();
        let Some(handle) = self.table.get_or_create(&src6, now, &mut self.pool) else {
            warn!("failed to acquire a mapping for {src6} (mapping pool full?)");
            return self.drop_packet();
        };
        if !existed {
            self.metrics.mappings_created.inc();
        }
        let mapping = *self.table.get(handle);

        // The destination already carries the IPv4 address under the prefix.
        let dst4 = match prefix.extract(&dst6) {
            Ok(addr) => addr,
            Err(_) => return self.drop_packet(),
        };

        msg.set_offset(ipv6::HEADER_SIZE);
        msg.remove_header(ipv6::HEADER_SIZE);

        let Some(protocol) = header::protocol_for_next_header(next_header) else {
            warn!("outgoing packet carries untranslatable next header {next_header}, drop");
            return self.drop_packet();
        };

        if protocol == Protocol::Icmp as u8 {
            if let Err(err) = icmp::translate_icmp6(msg, &mapping, &prefix) {
                warn!("ICMPv6 translation failed: {err}, drop");
                return self.drop_packet();
            }
            // The rebuilt ICMP message is all payload for the new header.
            msg.set_offset(0);
        } else if let Err(err) =
            update_transport_checksum_6to4(msg, protocol, &src6, &dst6, mapping.ip4, dst4)
        {
            warn!("transport checksum update failed: {err}, drop");
            return self.drop_packet();
        }

        let payload_len = msg.len() - msg.offset();
        let ip4_header = header::build_ipv4(mapping.ip4, dst4, protocol, ttl, payload_len);
        if msg.prepend_bytes(&ip4_header).is_err() {
            warn!("insufficient headroom to prepend the IPv4 header, drop");
            return self.drop_packet();
        }

        self.metrics.packets_translated_6to4.inc();
        Verdict::Forward
    }

    /// Translates an incoming IPv4 message into IPv6. Native IPv6 messages
    /// pass through untouched.
    pub fn handle_incoming(&mut self, msg: &mut Message) -> Verdict {
        if !self.enabled {
            self.metrics.packets_passthrough.inc();
            return Verdict::Forward;
        }

        if Ipv6Header::parse(msg.as_slice()).is_ok() {
            self.metrics.packets_passthrough.inc();
            return Verdict::Forward;
        }

        let (src4, dst4, protocol, ttl, ihl, total_length) =
            match Ipv4Header::parse(msg.as_slice()) {
                Ok(hdr) => (
                    hdr.src_addr(),
                    hdr.dst_addr(),
                    hdr.protocol(),
                    hdr.ttl(),
                    hdr.ihl(),
                    hdr.total_length(),
                ),
                Err(_) => {
                    warn!("incoming message is neither IPv4 nor IPv6, drop");
                    return self.drop_packet();
                }
            };
        if ihl != 5 {
            warn!("incoming packet carries IPv4 options, drop");
            return self.drop_packet();
        }
        if total_length as usize != msg.len() {
            warn!("incoming packet length disagrees with its total length, drop");
            return self.drop_packet();
        }

        let Some(prefix) = self.nat64_prefix.filter(Ipv6Prefix::is_valid_nat64) else {
            warn!("incoming IPv4 packet but no NAT64 prefix configured, drop");
            return self.drop_packet();
        };

        if ttl <= 1 {
            debug!("incoming packet TTL reached, drop");
            return self.drop_packet();
        }
        let hop_limit = ttl - 1;

        let now = self.clock.now_ms();
        let Some(handle) = self.table.find_by_ip4(&dst4) else {
            warn!("no mapping found for {dst4}, drop");
            return self.drop_packet();
        };
        self.table.touch(handle, now);
        let mapping = *self.table.get(handle);

        let src6 = match prefix.synthesize(src4) {
            Ok(addr) => addr,
            Err(_) => return self.drop_packet(),
        };
        let dst6 = mapping.ip6;

        msg.set_offset(ipv4::HEADER_SIZE);
        msg.remove_header(ipv4::HEADER_SIZE);

        let Some(next_header) = header::next_header_for_protocol(protocol) else {
            warn!("incoming packet carries untranslatable protocol {protocol}, drop");
            return self.drop_packet();
        };

        if protocol == Protocol::Icmp as u8 {
            if let Err(err) = icmp::translate_icmp4(msg, &mapping, &prefix, &src6, &dst6) {
                warn!("ICMP translation failed: {err}, drop");
                return self.drop_packet();
            }
            // The rebuilt ICMP message is all payload for the new header.
            msg.set_offset(0);
        } else if let Err(err) =
            update_transport_checksum_4to6(msg, protocol, src4, dst4, &src6, &dst6)
        {
            warn!("transport checksum update failed: {err}, drop");
            return self.drop_packet();
        }

        let payload_len = msg.len() - msg.offset();
        let ip6_header = header::build_ipv6(src6, dst6, next_header, hop_limit, payload_len);
        if msg.prepend_bytes(&ip6_header).is_err() {
            warn!("insufficient headroom to prepend the IPv6 header, drop");
            return self.drop_packet();
        }

        self.metrics.packets_translated_4to6.inc();
        Verdict::Forward
    }

    /// Installs the IPv4 CIDR the pool addresses are drawn from.
    ///
    /// Installing a different CIDR resets the translator: every mapping is
    /// freed and the pool is rebuilt. Reinstalling the current CIDR is a
    /// no-op that preserves the mapping table.
    pub fn set_ip4_cidr(&mut self, cidr: Ipv4Cidr) -> Result<()> {
        if cidr.length() == 0 {
            return Err(Error::InvalidArgs(
                "IPv4 CIDR prefix length must be at least 1".into(),
            ));
        }
        if self.ip4_cidr == Some(cidr) {
            return Ok(());
        }

        self.table.reset();
        self.pool.install(&cidr)?;
        info!(
            "IPv4 CIDR for NAT64: {cidr} ({} available addresses)",
            self.pool.available()
        );
        self.ip4_cidr = Some(cidr);
        Ok(())
    }

    /// Records the NAT64 prefix. Existing mappings stay valid: their IPv4
    /// bindings do not depend on the IPv6 synthesis prefix.
    pub fn set_nat64_prefix(&mut self, prefix: Ipv6Prefix) {
        if self.nat64_prefix != Some(prefix) {
            info!("NAT64 prefix updated to {prefix}");
            self.nat64_prefix = Some(prefix);
        }
    }

    /// Enables or disables translation. Enabling requires an installed
    /// CIDR; while disabled every message passes through untouched.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if enabled && self.ip4_cidr.is_none() {
            return Err(Error::InvalidState(
                "enabling NAT64 requires an installed IPv4 CIDR".into(),
            ));
        }
        self.enabled = enabled;
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ip4_cidr(&self) -> Option<Ipv4Cidr> {
        self.ip4_cidr
    }

    pub fn nat64_prefix(&self) -> Option<Ipv6Prefix> {
        self.nat64_prefix
    }

    /// Number of active mappings.
    pub fn mapping_count(&self) -> usize {
        self.table.active_count()
    }

    pub fn metrics(&self) -> &Nat64Metrics {
        &self.metrics
    }

    /// Overrides the mapping idle timeout (default
    /// [`MAPPING_IDLE_TIMEOUT_SECS`]).
    pub fn set_idle_timeout(&mut self, timeout: Duration) {
        self.table.set_idle_timeout_ms(timeout.as_millis() as u64);
    }

    /// The clock driving mapping expiry.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn drop_packet(&mut self) -> Verdict {
        self.metrics.packets_dropped.inc();
        Verdict::Drop
    }
}

/// Adjusts a TCP/UDP checksum for the IPv6 to IPv4 pseudo-header change.
/// The message starts at the transport header.
fn update_transport_checksum_6to4(
    msg: &mut Message,
    protocol: u8,
    src6: &Ipv6Addr,
    dst6: &Ipv6Addr,
    src4: Ipv4Addr,
    dst4: Ipv4Addr,
) -> Result<()> {
    let offset = match protocol {
        p if p == Protocol::Tcp as u8 => tcp::CHECKSUM_OFFSET,
        p if p == Protocol::Udp as u8 => udp::CHECKSUM_OFFSET,
        _ => return Ok(()),
    };

    let mut field = [0u8; 2];
    if msg.read_bytes(offset, &mut field) != 2 {
        return Err(Error::Parse("transport header too short".into()));
    }
    let old = u16::from_be_bytes(field);
    if protocol == Protocol::Udp as u8 && old == 0 {
        // No checksum to adjust; IPv4 permits an absent UDP checksum.
        debug!("outgoing UDP packet carries no checksum");
        return Ok(());
    }

    let len = (msg.len() - msg.offset()) as u16;
    let mut new = checksum::replace_pseudo_header_sum(
        old,
        checksum::pseudo_header_sum_v6(src6, dst6, protocol, u32::from(len)),
        checksum::pseudo_header_sum_v4(src4, dst4, protocol, len),
    );
    if protocol == Protocol::Udp as u8 && new == 0 {
        new = 0xFFFF;
    }
    msg.write_bytes(offset, &new.to_be_bytes())
}

/// Adjusts a TCP/UDP checksum for the IPv4 to IPv6 pseudo-header change.
/// An absent IPv4 UDP checksum is replaced by a freshly computed one, which
/// is mandatory over IPv6.
fn update_transport_checksum_4to6(
    msg: &mut Message,
    protocol: u8,
    src4: Ipv4Addr,
    dst4: Ipv4Addr,
    src6: &Ipv6Addr,
    dst6: &Ipv6Addr,
) -> Result<()> {
    let offset = match protocol {
        p if p == Protocol::Tcp as u8 => tcp::CHECKSUM_OFFSET,
        p if p == Protocol::Udp as u8 => udp::CHECKSUM_OFFSET,
        _ => return Ok(()),
    };

    let mut field = [0u8; 2];
    if msg.read_bytes(offset, &mut field) != 2 {
        return Err(Error::Parse("transport header too short".into()));
    }
    let old = u16::from_be_bytes(field);

    let new = if protocol == Protocol::Udp as u8 && old == 0 {
        let mut length = [0u8; 2];
        if msg.read_bytes(4, &mut length) != 2 {
            return Err(Error::Parse("UDP header too short".into()));
        }
        let udp_len = u16::from_be_bytes(length);
        let sum = checksum::pseudo_header_sum_v6(src6, dst6, protocol, u32::from(udp_len))
            + msg.sum_bytes(0, msg.len());
        match !checksum::fold(sum) {
            0 => 0xFFFF,
            sum => sum,
        }
    } else {
        let len = (msg.len() - msg.offset()) as u16;
        let adjusted = checksum::replace_pseudo_header_sum(
            old,
            checksum::pseudo_header_sum_v4(src4, dst4, protocol, len),
            checksum::pseudo_header_sum_v6(src6, dst6, protocol, u32::from(len)),
        );
        if protocol == Protocol::Udp as u8 && adjusted == 0 {
            0xFFFF
        } else {
            adjusted
        }
    };

    msg.write_bytes(offset, &new.to_be_bytes())
}
