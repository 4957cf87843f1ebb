//! Allocation engines over a simulated linear arena.
//!
//! Two engines share the [`Allocator`] surface:
//! - [`FreeListAllocator`] keeps an ordered free list and serves requests by
//!   first, best, or worst fit, splitting on allocation and coalescing on
//!   free.
//! - [`BuddyAllocator`] works in power-of-two size classes, splitting
//!   recursively on allocation and merging buddy pairs on free.
//!
//! Both hand out opaque [`BlockId`]s; the buddy engine additionally exposes
//! its native byte-address interface (`allocate_raw`/`free_raw`).

mod buddy;
mod freelist;
mod traits;

pub use buddy::BuddyAllocator;
pub use freelist::{FitStrategy, FreeListAllocator, MemoryBlock};
pub use traits::{build_allocator, Allocator, AllocatorKind, BlockId};
