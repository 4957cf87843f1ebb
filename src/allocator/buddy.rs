//! Buddy allocator with power-of-two size classes.
//!
//! The arena is `2^max_order` bytes. Each order `k` keeps a list of free
//! block addresses of size `2^k`. Allocation takes from the smallest order
//! that fits and splits larger blocks down, pushing the upper half back at
//! each step; freeing walks back up, merging a block with its buddy
//! (`addr XOR 2^k`) for as long as the buddy is free.

use core::fmt;
use std::collections::HashMap;
use std::collections::VecDeque;

use tracing::{debug, trace};

use super::{Allocator, BlockId};
use crate::core::error::{MemoryError, MemoryResult};
use crate::utils::{is_power_of_two, log2_pow2, next_power_of_two};

#[derive(Debug, Clone, Copy)]
struct Allocation {
    order: u32,
    // The size the caller actually asked for, kept for fragmentation
    // accounting.
    requested: usize,
}

/// Power-of-two allocator with splitting and buddy coalescing.
pub struct BuddyAllocator {
    total_size: usize,
    max_order: u32,
    // free_lists[k] holds start addresses of free 2^k-byte blocks.
    free_lists: Vec<VecDeque<usize>>,
    allocated: HashMap<usize, Allocation>,
    // Id adapter for the common allocator surface.
    id_to_addr: HashMap<BlockId, usize>,
    next_id: u64,
}

impl BuddyAllocator {
    /// Creates an arena of `total_size` bytes, which must be a power of two.
    pub fn new(total_size: usize) -> MemoryResult<Self> {
        if total_size == 0 {
            return Err(MemoryError::ZeroSize { what: "arena size" });
        }
        if !is_power_of_two(total_size) {
            return Err(MemoryError::NotPowerOfTwo {
                what: "arena size",
                value: total_size,
            });
        }

        let max_order = log2_pow2(total_size);
        let mut free_lists = vec![VecDeque::new(); max_order as usize + 1];
        free_lists[max_order as usize].push_back(0);

        Ok(Self {
            total_size,
            max_order,
            free_lists,
            allocated: HashMap::new(),
            id_to_addr: HashMap::new(),
            next_id: 1,
        })
    }

    /// Highest order managed by this arena; a block of that order spans it.
    pub fn max_order(&self) -> u32 {
        self.max_order
    }

    /// Free block addresses at the given order, in list order.
    pub fn free_blocks(&self, order: u32) -> impl Iterator<Item = usize> + '_ {
        self.free_lists[order as usize].iter().copied()
    }

    /// Allocates `size` bytes and returns the block's base address.
    ///
    /// The request is rounded up to the next power of two. Returns `None`
    /// for a zero-sized or oversized request, or when no block fits.
    pub fn allocate_raw(&mut self, size: usize) -> Option<usize> {
        if size == 0 || size > self.total_size {
            return None;
        }
        let target_order = log2_pow2(next_power_of_two(size));

        // Smallest order at or above the target with a free block.
        let source_order = (target_order..=self.max_order)
            .find(|&k| !self.free_lists[k as usize].is_empty())?;
        let addr = match self.free_lists[source_order as usize].pop_front() {
            Some(addr) => addr,
            None => return None,
        };

        // Split down to the target, giving the upper half back at each step.
        // The lower half stays the base of the allocated region.
        let mut order = source_order;
        while order > target_order {
            order -= 1;
            let buddy = addr + (1usize << order);
            self.free_lists[order as usize].push_front(buddy);
            trace!(addr, buddy, order, "split block");
        }

        self.allocated.insert(
            addr,
            Allocation {
                order: target_order,
                requested: size,
            },
        );
        debug!(addr, order = target_order, size, "allocated");
        Some(addr)
    }

    /// Frees the block starting at `addr`. Unknown addresses are ignored.
    pub fn free_raw(&mut self, addr: usize) {
        let Some(allocation) = self.allocated.remove(&addr) else {
            return;
        };

        let mut addr = addr;
        let mut order = allocation.order;
        while order < self.max_order {
            let buddy = addr ^ (1usize << order);
            let list = &mut self.free_lists[order as usize];
            let Some(pos) = list.iter().position(|&a| a == buddy) else {
                break;
            };
            let _ = list.remove(pos);
            addr = addr.min(buddy);
            order += 1;
            trace!(addr, order, "coalesced with buddy");
        }
        self.free_lists[order as usize].push_front(addr);
        debug!(addr, order, "freed");
    }

    /// Bytes handed out, counting the power-of-two rounding.
    pub fn allocated_memory(&self) -> usize {
        self.allocated.values().map(|a| 1usize << a.order).sum()
    }

    /// Rounding waste inside allocated blocks as a fraction of allocated
    /// bytes. 0.0 when nothing is allocated.
    pub fn internal_fragmentation(&self) -> f64 {
        let allocated = self.allocated_memory();
        if allocated == 0 {
            return 0.0;
        }
        let requested: usize = self.allocated.values().map(|a| a.requested).sum();
        (allocated - requested) as f64 / allocated as f64
    }

    /// Verifies that no order holds both halves of a buddy pair; such a pair
    /// should have been coalesced.
    pub fn check_no_free_buddy_pairs(&self) -> bool {
        for order in 0..self.max_order {
            let list = &self.free_lists[order as usize];
            for &addr in list {
                let buddy = addr ^ (1usize << order);
                if list.iter().any(|&other| other == buddy) {
                    return false;
                }
            }
        }
        true
    }

    /// Verifies that free blocks overlap neither each other nor any
    /// allocated block.
    pub fn check_no_overlaps(&self) -> bool {
        let mut regions: Vec<(usize, usize)> = Vec::new();
        for order in 0..=self.max_order {
            let size = 1usize << order;
            regions.extend(self.free_lists[order as usize].iter().map(|&a| (a, size)));
        }
        regions.extend(
            self.allocated
                .iter()
                .map(|(&addr, alloc)| (addr, 1usize << alloc.order)),
        );
        regions.sort_unstable();
        regions.windows(2).all(|w| w[0].0 + w[0].1 <= w[1].0)
    }
}

impl Allocator for BuddyAllocator {
    fn allocate(&mut self, size: usize) -> Option<BlockId> {
        let addr = self.allocate_raw(size)?;
        let id = BlockId::new(self.next_id);
        self.next_id += 1;
        self.id_to_addr.insert(id, addr);
        Some(id)
    }

    fn free(&mut self, id: BlockId) {
        let Some(addr) = self.id_to_addr.remove(&id) else {
            return;
        };
        self.free_raw(addr);
    }

    fn total_memory(&self) -> usize {
        self.total_size
    }

    fn used_memory(&self) -> usize {
        self.allocated_memory()
    }

    fn largest_free_block(&self) -> usize {
        (0..=self.max_order)
            .rev()
            .find(|&k| !self.free_lists[k as usize].is_empty())
            .map_or(0, |k| 1usize << k)
    }

    fn name(&self) -> &'static str {
        "buddy"
    }
}

impl fmt::Display for BuddyAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "buddy arena, {} bytes", self.total_size)?;
        for order in 0..=self.max_order {
            let list = &self.free_lists[order as usize];
            if list.is_empty() {
                continue;
            }
            write!(f, "order {:2} (size {:6}):", order, 1usize << order)?;
            for &addr in list {
                write!(f, " {:#06x}", addr)?;
            }
            writeln!(f)?;
        }
        let mut used: Vec<_> = self.allocated.iter().collect();
        used.sort_unstable_by_key(|(addr, _)| **addr);
        for (&addr, alloc) in used {
            let size = 1usize << alloc.order;
            writeln!(
                f,
                "[{:#06x} - {:#06x}] used (size={})",
                addr,
                addr + size - 1,
                size
            )?;
        }
        Ok(())
    }
}
