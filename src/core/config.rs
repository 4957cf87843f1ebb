//! Builder-style configuration for assembling a full access pipeline.
//!
//! Each engine can be constructed directly; this module is the convenience
//! surface for wiring translation and both cache levels together in one go.

use crate::cache::{CacheHierarchy, CacheLevel};
use crate::core::error::MemoryResult;
use crate::pipeline::AccessPipeline;
use crate::vm::{ReplacementPolicy, VirtualMemoryManager};

/// Geometry of a single cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeometry {
    /// Total capacity in bytes.
    pub cache_size: usize,
    /// Line size in bytes.
    pub line_size: usize,
    /// Lines per set.
    pub associativity: usize,
}

impl CacheGeometry {
    /// Describes a cache of `cache_size` bytes with `line_size`-byte lines
    /// grouped `associativity` ways per set.
    #[must_use]
    pub const fn new(cache_size: usize, line_size: usize, associativity: usize) -> Self {
        Self {
            cache_size,
            line_size,
            associativity,
        }
    }
}

/// Configuration for the translate-then-cache access pipeline.
///
/// The defaults model a small teaching machine: 64 virtual pages of 4 KiB
/// over 16 physical frames with FIFO replacement, a 16 KiB direct-mapped L1,
/// and a 64 KiB 4-way L2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of virtual pages in the address space.
    pub num_virtual_pages: usize,
    /// Number of physical frames backing them.
    pub num_physical_frames: usize,
    /// Page size in bytes, a power of two.
    pub page_size: usize,
    /// Page replacement policy.
    pub policy: ReplacementPolicy,
    /// First-level cache geometry.
    pub l1: CacheGeometry,
    /// Second-level cache geometry.
    pub l2: CacheGeometry,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_virtual_pages: 64,
            num_physical_frames: 16,
            page_size: 4096,
            policy: ReplacementPolicy::Fifo,
            l1: CacheGeometry::new(16 * 1024, 64, 1),
            l2: CacheGeometry::new(64 * 1024, 64, 4),
        }
    }
}

impl PipelineConfig {
    /// Starts from the default teaching-machine configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of virtual pages.
    #[must_use]
    pub fn with_virtual_pages(mut self, num_virtual_pages: usize) -> Self {
        self.num_virtual_pages = num_virtual_pages;
        self
    }

    /// Sets the number of physical frames.
    #[must_use]
    pub fn with_physical_frames(mut self, num_physical_frames: usize) -> Self {
        self.num_physical_frames = num_physical_frames;
        self
    }

    /// Sets the page size in bytes.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the page replacement policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReplacementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the L1 geometry.
    #[must_use]
    pub fn with_l1(mut self, l1: CacheGeometry) -> Self {
        self.l1 = l1;
        self
    }

    /// Sets the L2 geometry.
    #[must_use]
    pub fn with_l2(mut self, l2: CacheGeometry) -> Self {
        self.l2 = l2;
        self
    }

    /// Validates the geometry and builds the pipeline.
    pub fn build(self) -> MemoryResult<AccessPipeline> {
        let vm = VirtualMemoryManager::new(
            self.num_virtual_pages,
            self.num_physical_frames,
            self.page_size,
            self.policy,
        )?;
        let l1 = CacheLevel::new(self.l1.cache_size, self.l1.line_size, self.l1.associativity)?;
        let l2 = CacheLevel::new(self.l2.cache_size, self.l2.line_size, self.l2.associativity)?;
        Ok(AccessPipeline::new(vm, CacheHierarchy::new(l1, l2)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::MemoryError;

    #[test]
    fn test_default_config_builds() {
        let pipeline = PipelineConfig::default().build().unwrap();
        assert_eq!(pipeline.caches().l1().num_sets(), 256);
        assert_eq!(pipeline.caches().l2().num_sets(), 256);
    }

    #[test]
    fn test_invalid_page_size_rejected() {
        let err = PipelineConfig::new().with_page_size(1000).build().unwrap_err();
        assert_eq!(
            err,
            MemoryError::NotPowerOfTwo {
                what: "page size",
                value: 1000,
            }
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::new()
            .with_virtual_pages(8)
            .with_physical_frames(4)
            .with_policy(ReplacementPolicy::Lru)
            .with_l1(CacheGeometry::new(256, 64, 1));
        assert_eq!(config.num_virtual_pages, 8);
        assert_eq!(config.l1.cache_size, 256);
        assert!(config.build().is_ok());
    }
}
