//! # memsim
//!
//! An educational simulator for the memory subsystem of a computer: how a
//! program's virtual addresses become physical frames, how competing
//! allocation policies carve up a linear arena, and how a multi-level cache
//! absorbs the resulting physical-address stream.
//!
//! Four engines and one piece of glue:
//! - [`allocator::FreeListAllocator`]: first/best/worst fit over an ordered
//!   free list with splitting and coalescing
//! - [`allocator::BuddyAllocator`]: power-of-two size classes with buddy
//!   coalescing
//! - [`cache::CacheLevel`] and [`cache::CacheHierarchy`]: set-associative
//!   levels composed with inclusive refill
//! - [`vm::VirtualMemoryManager`]: page table, frame pool, FIFO or LRU
//!   replacement
//! - [`pipeline::AccessPipeline`]: virtual address in, translation plus
//!   cache probe out
//!
//! Everything is single-threaded and synchronous. Nothing models real byte
//! storage or timing; timestamps are per-engine logical counters used as
//! eviction tie-breakers.
//!
//! ## Quick start
//!
//! ```
//! use memsim::prelude::*;
//!
//! fn main() -> MemoryResult<()> {
//!     let mut pipeline = PipelineConfig::new()
//!         .with_policy(ReplacementPolicy::Lru)
//!         .build()?;
//!
//!     let cold = pipeline.access(0x1234)?;
//!     assert!(cold.page_fault && !cold.cache_hit);
//!
//!     let warm = pipeline.access(0x1234)?;
//!     assert!(!warm.page_fault && warm.cache_hit);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod allocator;
pub mod cache;
pub mod core;
pub mod pipeline;
pub mod utils;
pub mod vm;

pub use crate::core::{MemoryError, MemoryResult};

/// Convenient re-exports of the commonly used types.
pub mod prelude {
    pub use crate::allocator::{
        build_allocator, Allocator, AllocatorKind, BlockId, BuddyAllocator, FitStrategy,
        FreeListAllocator,
    };
    pub use crate::cache::{CacheHierarchy, CacheLevel};
    pub use crate::core::{CacheGeometry, MemoryError, MemoryResult, PipelineConfig};
    pub use crate::pipeline::{AccessEvent, AccessPipeline};
    pub use crate::vm::{ReplacementPolicy, VirtualMemoryManager};
}
