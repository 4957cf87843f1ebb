//! Two-level inclusive cache hierarchy.

use super::CacheLevel;

/// An L1 backed by an L2.
///
/// A hit at either level services the access; every level below the one that
/// hit is refilled, so L1 always ends up holding the accessed line. The
/// counters are read through from the levels, which means
/// `l2_hits() + l2_misses()` always equals `l1_misses()`.
#[derive(Debug)]
pub struct CacheHierarchy {
    l1: CacheLevel,
    l2: CacheLevel,
}

impl CacheHierarchy {
    /// Takes ownership of both levels; `l1` is probed first.
    pub fn new(l1: CacheLevel, l2: CacheLevel) -> Self {
        Self { l1, l2 }
    }

    /// Runs one physical-address access through the hierarchy, returning
    /// whether any level hit.
    pub fn access(&mut self, address: u64) -> bool {
        if self.l1.access(address) {
            return true;
        }

        // The L1 miss already installed the line there; the L2 probe below
        // does the same for L2 on a miss, so the explicit fills only refresh.
        if self.l2.access(address) {
            self.l1.fill(address);
            return true;
        }

        self.l2.fill(address);
        self.l1.fill(address);
        false
    }

    /// First-level cache.
    pub fn l1(&self) -> &CacheLevel {
        &self.l1
    }

    /// Second-level cache.
    pub fn l2(&self) -> &CacheLevel {
        &self.l2
    }

    /// L1 hits.
    pub fn l1_hits(&self) -> u64 {
        self.l1.hits()
    }

    /// L1 misses.
    pub fn l1_misses(&self) -> u64 {
        self.l1.misses()
    }

    /// L2 hits.
    pub fn l2_hits(&self) -> u64 {
        self.l2.hits()
    }

    /// L2 misses.
    pub fn l2_misses(&self) -> u64 {
        self.l2.misses()
    }

    /// Invalidates both levels and clears their counters.
    pub fn flush(&mut self) {
        self.l1.flush();
        self.l2.flush();
    }
}
