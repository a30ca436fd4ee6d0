//! Stateful NAT64 translator core.
//!
//! Rewrites IPv6 packets destined to a configured NAT64 prefix (RFC 6052)
//! into IPv4 packets sourced from a configured address pool, and rewrites
//! returning IPv4 packets back into IPv6 through a bounded bidirectional
//! address-mapping table. TCP, UDP and ICMP are supported, including the
//! translation of packets embedded in ICMP error messages.
//!
//! The crate does no I/O: the caller hands each packet in as a [`Message`]
//! and forwards, drops or answers it according to the returned
//! [`translator::Verdict`].

pub mod config;
pub mod error;
pub mod message;
pub mod protocol;
pub mod telemetry;
pub mod translator;

pub use error::{Error, Result};
pub use message::Message;
pub use translator::{Nat64Translator, Verdict};
