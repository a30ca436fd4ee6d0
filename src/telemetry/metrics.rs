//! Counters for translation statistics.
//!
//! Counters are atomic so a registry can be read while the owning
//! translator keeps processing on another thread of control.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter for thread-safe increment operations.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Creates a new counter initialized to zero.
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increments the counter by 1.
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds a value to the counter.
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Gets the current value of the counter.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Statistics kept by one translator instance.
#[derive(Debug, Default)]
pub struct Nat64Metrics {
    /// Packets translated from IPv6 to IPv4.
    pub packets_translated_6to4: Counter,
    /// Packets translated from IPv4 to IPv6.
    pub packets_translated_4to6: Counter,
    /// Packets intentionally forwarded untouched.
    pub packets_passthrough: Counter,
    /// Packets discarded.
    pub packets_dropped: Counter,
    /// Address mappings created.
    pub mappings_created: Counter,
}

impl Nat64Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);
        counter.inc();
        counter.inc();
        counter.add(3);
        assert_eq!(counter.get(), 5);
    }

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = Nat64Metrics::new();
        assert_eq!(metrics.packets_translated_6to4.get(), 0);
        assert_eq!(metrics.packets_translated_4to6.get(), 0);
        assert_eq!(metrics.packets_passthrough.get(), 0);
        assert_eq!(metrics.packets_dropped.get(), 0);
        assert_eq!(metrics.mappings_created.get(), 0);
    }
}
