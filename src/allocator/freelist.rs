//! Free-list allocator over a contiguous arena.
//!
//! Blocks form an address-ordered sequence covering the whole arena with no
//! gaps. Allocation scans the sequence according to the configured fit
//! strategy and splits the chosen hole; freeing coalesces with both
//! neighbours, so two adjacent free blocks never coexist.

use core::fmt;

use tracing::{debug, trace};

use super::{Allocator, BlockId};
use crate::core::error::{MemoryError, MemoryResult};

/// How `allocate` chooses among the free blocks that fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitStrategy {
    /// First free block large enough, in address order.
    #[default]
    FirstFit,
    /// Smallest free block large enough; ties break toward the lowest address.
    BestFit,
    /// Largest free block; ties break toward the lowest address.
    WorstFit,
}

impl FitStrategy {
    /// Short human-readable name.
    pub const fn as_str(self) -> &'static str {
        match self {
            FitStrategy::FirstFit => "first-fit",
            FitStrategy::BestFit => "best-fit",
            FitStrategy::WorstFit => "worst-fit",
        }
    }
}

/// One block in the arena, free or allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBlock {
    /// Byte offset of the block within the arena.
    pub start: usize,
    /// Block length in bytes, always positive.
    pub size: usize,
    /// Whether the block is available.
    pub free: bool,
    /// Id of the allocation occupying this block, `None` while free.
    pub id: Option<BlockId>,
}

/// Contiguous-block allocator with first/best/worst-fit strategies.
pub struct FreeListAllocator {
    total_size: usize,
    // Address-ordered, gap-free cover of the arena.
    blocks: Vec<MemoryBlock>,
    strategy: FitStrategy,
    next_id: u64,
}

impl FreeListAllocator {
    /// Creates an arena of `total_size` bytes as a single free block.
    pub fn new(total_size: usize, strategy: FitStrategy) -> MemoryResult<Self> {
        if total_size == 0 {
            return Err(MemoryError::ZeroSize { what: "arena size" });
        }
        Ok(Self {
            total_size,
            blocks: vec![MemoryBlock {
                start: 0,
                size: total_size,
                free: true,
                id: None,
            }],
            strategy,
            next_id: 1,
        })
    }

    /// Switches the fit strategy for subsequent allocations.
    pub fn set_strategy(&mut self, strategy: FitStrategy) {
        self.strategy = strategy;
    }

    /// Currently configured fit strategy.
    pub fn strategy(&self) -> FitStrategy {
        self.strategy
    }

    /// Address-ordered view of every block in the arena.
    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    /// Free memory that cannot be handed out as one contiguous block, as a
    /// fraction of all free memory. 0.0 when nothing is free.
    pub fn external_fragmentation(&self) -> f64 {
        let free = self.free_memory();
        if free == 0 {
            return 0.0;
        }
        1.0 - self.largest_free_block() as f64 / free as f64
    }

    fn find_fit(&self, size: usize) -> Option<usize> {
        let mut chosen: Option<usize> = None;
        for (idx, block) in self.blocks.iter().enumerate() {
            if !block.free || block.size < size {
                continue;
            }
            match self.strategy {
                FitStrategy::FirstFit => return Some(idx),
                FitStrategy::BestFit => {
                    if chosen.map_or(true, |c| block.size < self.blocks[c].size) {
                        chosen = Some(idx);
                    }
                }
                FitStrategy::WorstFit => {
                    if chosen.map_or(true, |c| block.size > self.blocks[c].size) {
                        chosen = Some(idx);
                    }
                }
            }
        }
        chosen
    }

    fn allocate_at(&mut self, idx: usize, size: usize) -> BlockId {
        let id = BlockId::new(self.next_id);
        self.next_id += 1;

        let block = &mut self.blocks[idx];
        if block.size == size {
            block.free = false;
            block.id = Some(id);
        } else {
            // Carve the allocation off the front so the sequence stays
            // address-ordered.
            let allocated = MemoryBlock {
                start: block.start,
                size,
                free: false,
                id: Some(id),
            };
            block.start += size;
            block.size -= size;
            self.blocks.insert(idx, allocated);
        }
        id
    }
}

impl Allocator for FreeListAllocator {
    fn allocate(&mut self, size: usize) -> Option<BlockId> {
        if size == 0 {
            return None;
        }
        let Some(idx) = self.find_fit(size) else {
            debug!(size, strategy = self.strategy.as_str(), "allocation failed");
            return None;
        };
        let id = self.allocate_at(idx, size);
        debug!(
            id = id.get(),
            size,
            strategy = self.strategy.as_str(),
            "allocated block"
        );
        Some(id)
    }

    fn free(&mut self, id: BlockId) {
        let Some(mut idx) = self.blocks.iter().position(|b| b.id == Some(id)) else {
            // Unknown or already-freed id.
            return;
        };
        self.blocks[idx].free = true;
        self.blocks[idx].id = None;

        // Merge into a free predecessor first, then swallow a free successor.
        if idx > 0 && self.blocks[idx - 1].free {
            self.blocks[idx - 1].size += self.blocks[idx].size;
            self.blocks.remove(idx);
            idx -= 1;
            trace!(start = self.blocks[idx].start, "coalesced with predecessor");
        }
        if idx + 1 < self.blocks.len() && self.blocks[idx + 1].free {
            self.blocks[idx].size += self.blocks[idx + 1].size;
            self.blocks.remove(idx + 1);
            trace!(start = self.blocks[idx].start, "coalesced with successor");
        }
        debug!(id = id.get(), "freed block");
    }

    fn total_memory(&self) -> usize {
        self.total_size
    }

    fn used_memory(&self) -> usize {
        self.blocks.iter().filter(|b| !b.free).map(|b| b.size).sum()
    }

    fn largest_free_block(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.free)
            .map(|b| b.size)
            .max()
            .unwrap_or(0)
    }

    fn name(&self) -> &'static str {
        "free list"
    }
}

impl fmt::Display for FreeListAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} arena, {} bytes ({})",
            self.name(),
            self.total_size,
            self.strategy.as_str()
        )?;
        for block in &self.blocks {
            let end = block.start + block.size - 1;
            if let Some(id) = block.id {
                writeln!(f, "[{:#06x} - {:#06x}] used (id={})", block.start, end, id)?;
            } else {
                writeln!(f, "[{:#06x} - {:#06x}] free", block.start, end)?;
            }
        }
        Ok(())
    }
}
