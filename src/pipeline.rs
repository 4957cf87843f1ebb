//! Glue that routes a virtual access through translation and then the cache
//! hierarchy.
//!
//! The allocators stay out of this path: they hand out block identifiers
//! that a caller may turn into synthetic access patterns, but only the
//! virtual-memory manager produces the physical addresses the caches see.

use core::fmt;

use tracing::debug;

use crate::cache::CacheHierarchy;
use crate::core::error::MemoryResult;
use crate::vm::VirtualMemoryManager;

/// What happened to one virtual-address access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessEvent {
    /// The address the caller asked for.
    pub virtual_address: u64,
    /// Where translation placed it.
    pub physical_address: u64,
    /// Whether the page had to be faulted in.
    pub page_fault: bool,
    /// Whether any cache level hit.
    pub cache_hit: bool,
}

impl fmt::Display for AccessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#010x} -> {:#010x} {:8} {}",
            self.virtual_address,
            self.physical_address,
            if self.page_fault { "fault" } else { "resident" },
            if self.cache_hit { "hit" } else { "miss" },
        )
    }
}

/// Translation in front of a two-level cache.
#[derive(Debug)]
pub struct AccessPipeline {
    vm: VirtualMemoryManager,
    caches: CacheHierarchy,
    accesses: u64,
}

impl AccessPipeline {
    /// Wires a virtual-memory manager to a cache hierarchy.
    pub fn new(vm: VirtualMemoryManager, caches: CacheHierarchy) -> Self {
        Self {
            vm,
            caches,
            accesses: 0,
        }
    }

    /// Translates `virtual_address` and runs the resulting physical address
    /// through the cache hierarchy.
    pub fn access(&mut self, virtual_address: u64) -> MemoryResult<AccessEvent> {
        let faults_before = self.vm.page_faults();
        let physical_address = self.vm.translate(virtual_address)?;
        let page_fault = self.vm.page_faults() > faults_before;
        let cache_hit = self.caches.access(physical_address);
        self.accesses += 1;

        let event = AccessEvent {
            virtual_address,
            physical_address,
            page_fault,
            cache_hit,
        };
        debug!(%event, "memory access");
        Ok(event)
    }

    /// Successful accesses so far.
    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    /// The translation engine.
    pub fn vm(&self) -> &VirtualMemoryManager {
        &self.vm
    }

    /// The cache hierarchy.
    pub fn caches(&self) -> &CacheHierarchy {
        &self.caches
    }
}
