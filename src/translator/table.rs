//! Bidirectional address-mapping table.
//!
//! Mappings live in a fixed arena of slots addressed by `u16` handles. Each
//! slot's intrusive `next` link threads it onto either the free list or the
//! active list, never both. Lookups are linear scans over the active list;
//! with the list bounded by the pool capacity this stays cheap.
//!
//! There is no background sweeper. Idle mappings are reclaimed only when an
//! allocation fails, so a mapping may outlive its expiry for as long as the
//! arena has room.

use super::pool::AddressPool;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, info};

/// Idle interval after the last touch before a mapping becomes reclaimable.
pub const MAPPING_IDLE_TIMEOUT_SECS: u64 = 7200;

const MAPPING_IDLE_TIMEOUT_MS: u64 = MAPPING_IDLE_TIMEOUT_SECS * 1000;

/// Index of a mapping slot within the arena.
pub type Handle = u16;

/// One binding between a tracked IPv6 host and a pool IPv4 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMapping {
    pub ip6: Ipv6Addr,
    pub ip4: Ipv4Addr,
    /// Timestamp at which this mapping becomes reclaimable, in clock
    /// milliseconds.
    pub expiry_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    mapping: AddressMapping,
    next: Option<Handle>,
}

const EMPTY_SLOT: Slot = Slot {
    mapping: AddressMapping {
        ip6: Ipv6Addr::UNSPECIFIED,
        ip4: Ipv4Addr::UNSPECIFIED,
        expiry_ms: 0,
    },
    next: None,
};

/// Fixed-capacity mapping arena with an active list ordered by creation.
#[derive(Debug)]
pub struct MappingTable<const N: usize> {
    slots: [Slot; N],
    free_head: Option<Handle>,
    active_head: Option<Handle>,
    active_count: usize,
    idle_timeout_ms: u64,
}

impl<const N: usize> MappingTable<N> {
    pub fn new() -> Self {
        let mut slots = [EMPTY_SLOT; N];
        for (i, slot) in slots.iter_mut().enumerate() {
            slot.next = if i + 1 < N {
                Some((i + 1) as Handle)
            } else {
                None
            };
        }

        Self {
            slots,
            free_head: if N > 0 { Some(0) } else { None },
            active_head: None,
            active_count: 0,
            idle_timeout_ms: MAPPING_IDLE_TIMEOUT_MS,
        }
    }

    /// Overrides the idle timeout. Affects mappings touched afterwards.
    pub fn set_idle_timeout_ms(&mut self, timeout_ms: u64) {
        self.idle_timeout_ms = timeout_ms;
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn get(&self, handle: Handle) -> &AddressMapping {
        &self.slots[handle as usize].mapping
    }

    /// First active mapping bound to `ip6`, if any.
    pub fn find_by_ip6(&self, ip6: &Ipv6Addr) -> Option<Handle> {
        let mut cur = self.active_head;
        while let Some(h) = cur {
            if self.slots[h as usize].mapping.ip6 == *ip6 {
                return Some(h);
            }
            cur = self.slots[h as usize].next;
        }
        None
    }

    /// First active mapping bound to `ip4`, if any. The caller is expected
    /// to touch the mapping on a hit.
    pub fn find_by_ip4(&self, ip4: &Ipv4Addr) -> Option<Handle> {
        let mut cur = self.active_head;
        while let Some(h) = cur {
            if self.slots[h as usize].mapping.ip4 == *ip4 {
                return Some(h);
            }
            cur = self.slots[h as usize].next;
        }
        None
    }

    /// Pushes the expiry out to `now_ms + idle_timeout`.
    pub fn touch(&mut self, handle: Handle, now_ms: u64) {
        self.slots[handle as usize].mapping.expiry_ms = now_ms + self.idle_timeout_ms;
    }

    /// Looks up the mapping for `ip6`, creating one from the pool if
    /// needed. A failed slot allocation triggers an idle sweep and one
    /// retry. Returns `None` when the arena and the pool are both out of
    /// room.
    pub fn get_or_create(
        &mut self,
        ip6: &Ipv6Addr,
        now_ms: u64,
        pool: &mut AddressPool<N>,
    ) -> Option<Handle> {
        if let Some(handle) = self.find_by_ip6(ip6) {
            self.touch(handle, now_ms);
            return Some(handle);
        }

        let mut slot = self.alloc_slot();
        if slot.is_none() {
            let expired = self.expire_idle(now_ms, pool);
            if expired > 0 {
                debug!("reclaimed {expired} idle mappings");
            }
            slot = self.alloc_slot();
        }
        let handle = slot?;

        let Some(ip4) = pool.take() else {
            self.free_slot(handle);
            return None;
        };

        let slot = &mut self.slots[handle as usize];
        slot.mapping = AddressMapping {
            ip6: *ip6,
            ip4,
            expiry_ms: now_ms + self.idle_timeout_ms,
        };
        slot.next = self.active_head;
        self.active_head = Some(handle);
        self.active_count += 1;
        info!("mapping created: {ip6} -> {ip4}");

        Some(handle)
    }

    /// Unlinks every mapping with `expiry_ms < now_ms`, returning each IPv4
    /// address to the pool. Returns the number of mappings reclaimed.
    pub fn expire_idle(&mut self, now_ms: u64, pool: &mut AddressPool<N>) -> usize {
        let mut removed = 0;
        let mut prev: Option<Handle> = None;
        let mut cur = self.active_head;

        while let Some(h) = cur {
            let next = self.slots[h as usize].next;
            if self.slots[h as usize].mapping.expiry_ms < now_ms {
                match prev {
                    Some(p) => self.slots[p as usize].next = next,
                    None => self.active_head = next,
                }
                let mapping = self.slots[h as usize].mapping;
                info!("mapping removed: {} -> {}", mapping.ip6, mapping.ip4);
                pool.put(mapping.ip4);
                self.free_slot(h);
                self.active_count -= 1;
                removed += 1;
            } else {
                prev = Some(h);
            }
            cur = next;
        }

        removed
    }

    /// Frees every mapping. The address pool is left untouched; the caller
    /// reinstalls it when reconfiguring.
    pub fn reset(&mut self) {
        let mut cur = self.active_head;
        while let Some(h) = cur {
            cur = self.slots[h as usize].next;
            self.free_slot(h);
        }
        self.active_head = None;
        self.active_count = 0;
    }

    fn alloc_slot(&mut self) -> Option<Handle> {
        let handle = self.free_head?;
        self.free_head = self.slots[handle as usize].next;
        Some(handle)
    }

    fn free_slot(&mut self, handle: Handle) {
        self.slots[handle as usize].next = self.free_head;
        self.free_head = Some(handle);
    }
}

impl<const N: usize> Default for MappingTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
