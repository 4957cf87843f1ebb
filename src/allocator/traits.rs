//! The common surface shared by the allocation engines.

use core::fmt;

use super::{BuddyAllocator, FitStrategy, FreeListAllocator};
use crate::core::error::MemoryResult;

/// Identifier handed out for a successful allocation.
///
/// Ids come from a per-allocator monotonic counter starting at 1 and are
/// never reused, so a stale id can only ever miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl BlockId {
    #[inline]
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value of the id.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Common interface over the allocation engines.
///
/// Allocation failure is a `None`, not an error: state is unchanged and the
/// caller may retry with a smaller request or free something first. Freeing
/// an unknown id is a no-op, so double-free is tolerated.
pub trait Allocator {
    /// Allocates `size` bytes, returning an id on success.
    fn allocate(&mut self, size: usize) -> Option<BlockId>;

    /// Releases the allocation with the given id.
    fn free(&mut self, id: BlockId);

    /// Arena size in bytes.
    fn total_memory(&self) -> usize;

    /// Bytes currently allocated.
    fn used_memory(&self) -> usize;

    /// Bytes currently free.
    fn free_memory(&self) -> usize {
        self.total_memory() - self.used_memory()
    }

    /// Size of the largest free block, 0 if none.
    fn largest_free_block(&self) -> usize;

    /// Human-readable engine name.
    fn name(&self) -> &'static str;
}

/// Selects which engine [`build_allocator`] constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorKind {
    /// Free-list allocator with the given fit strategy.
    FreeList(FitStrategy),
    /// Buddy allocator with power-of-two size classes.
    Buddy,
}

/// Builds the selected engine over a `total_size`-byte arena.
pub fn build_allocator(
    kind: AllocatorKind,
    total_size: usize,
) -> MemoryResult<Box<dyn Allocator>> {
    match kind {
        AllocatorKind::FreeList(strategy) => {
            Ok(Box::new(FreeListAllocator::new(total_size, strategy)?))
        }
        AllocatorKind::Buddy => Ok(Box::new(BuddyAllocator::new(total_size)?)),
    }
}
