//! A single set-associative cache level.

use tracing::trace;

use crate::core::error::{MemoryError, MemoryResult};
use crate::utils::{is_power_of_two, log2_pow2};

/// A physical address split into its cache-relevant fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheAddress {
    /// High-order bits identifying the resident memory block.
    pub tag: u64,
    /// Which set the address maps to.
    pub index: usize,
    /// Byte position within the line.
    pub offset: usize,
}

/// One line in a set.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheLine {
    /// Whether the line holds data.
    pub valid: bool,
    /// Tag of the resident block.
    pub tag: u64,
    /// Fill timestamp; the victim-selection key within a set.
    pub inserted_at: u64,
}

/// Set-associative cache with hit/miss counting.
///
/// Victim selection is FIFO by insertion time: a hit does not refresh a
/// line's timestamp, only a fill does.
#[derive(Debug)]
pub struct CacheLevel {
    line_size: usize,
    associativity: usize,
    num_sets: usize,
    offset_bits: u32,
    index_bits: u32,
    hits: u64,
    misses: u64,
    timestamp: u64,
    sets: Vec<Vec<CacheLine>>,
}

impl CacheLevel {
    /// Builds a cache of `cache_size` bytes split into `line_size`-byte
    /// lines grouped `associativity` ways per set.
    ///
    /// `cache_size` must divide evenly into sets, and both the line size and
    /// the resulting set count must be powers of two.
    pub fn new(cache_size: usize, line_size: usize, associativity: usize) -> MemoryResult<Self> {
        if cache_size == 0 {
            return Err(MemoryError::ZeroSize { what: "cache size" });
        }
        if line_size == 0 {
            return Err(MemoryError::ZeroSize { what: "line size" });
        }
        if associativity == 0 {
            return Err(MemoryError::ZeroSize {
                what: "associativity",
            });
        }
        if cache_size % (line_size * associativity) != 0 {
            return Err(MemoryError::IndivisibleGeometry {
                cache_size,
                line_size,
                associativity,
            });
        }
        let num_sets = cache_size / (line_size * associativity);
        if !is_power_of_two(line_size) {
            return Err(MemoryError::NotPowerOfTwo {
                what: "line size",
                value: line_size,
            });
        }
        if !is_power_of_two(num_sets) {
            return Err(MemoryError::NotPowerOfTwo {
                what: "number of sets",
                value: num_sets,
            });
        }

        Ok(Self {
            line_size,
            associativity,
            num_sets,
            offset_bits: log2_pow2(line_size),
            index_bits: log2_pow2(num_sets),
            hits: 0,
            misses: 0,
            timestamp: 0,
            sets: vec![vec![CacheLine::default(); associativity]; num_sets],
        })
    }

    /// Number of sets.
    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Line size in bytes.
    pub fn line_size(&self) -> usize {
        self.line_size
    }

    /// Lines per set.
    pub fn associativity(&self) -> usize {
        self.associativity
    }

    /// Lines of one set, for state inspection.
    pub fn set_lines(&self, index: usize) -> &[CacheLine] {
        &self.sets[index]
    }

    /// Splits a physical address into tag, set index, and line offset.
    pub fn decode(&self, address: u64) -> CacheAddress {
        let offset_mask = (1u64 << self.offset_bits) - 1;
        let index_mask = (1u64 << self.index_bits) - 1;
        CacheAddress {
            offset: (address & offset_mask) as usize,
            index: ((address >> self.offset_bits) & index_mask) as usize,
            tag: address >> (self.offset_bits + self.index_bits),
        }
    }

    /// Looks up `address`, counting a hit or a miss. A miss installs the
    /// line before returning.
    pub fn access(&mut self, address: u64) -> bool {
        let addr = self.decode(address);
        if self.sets[addr.index]
            .iter()
            .any(|line| line.valid && line.tag == addr.tag)
        {
            self.hits += 1;
            return true;
        }
        self.misses += 1;
        self.install(addr);
        false
    }

    /// Installs `address` without touching the hit/miss counters. Used by
    /// the hierarchy to refill this level after an outer-level hit.
    pub fn fill(&mut self, address: u64) {
        let addr = self.decode(address);
        self.install(addr);
    }

    /// Invalidates every line and clears the counters.
    pub fn flush(&mut self) {
        for set in &mut self.sets {
            for line in set.iter_mut() {
                *line = CacheLine::default();
            }
        }
        self.hits = 0;
        self.misses = 0;
        self.timestamp = 0;
    }

    /// Cache hits so far.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Cache misses so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Fraction of accesses that hit, 0.0 before any access.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }

    // A repeated fill of a resident tag must refresh that line in place
    // rather than install a duplicate alongside it.
    fn install(&mut self, addr: CacheAddress) {
        let stamp = self.timestamp;
        self.timestamp += 1;
        let set = &mut self.sets[addr.index];

        if let Some(line) = set.iter_mut().find(|l| l.valid && l.tag == addr.tag) {
            line.inserted_at = stamp;
            return;
        }

        let victim_idx = match set.iter().position(|l| !l.valid) {
            Some(idx) => idx,
            None => {
                // All lines valid; evict the oldest fill.
                let mut oldest = 0;
                for (idx, line) in set.iter().enumerate() {
                    if line.inserted_at < set[oldest].inserted_at {
                        oldest = idx;
                    }
                }
                trace!(
                    index = addr.index,
                    evicted_tag = set[oldest].tag,
                    new_tag = addr.tag,
                    "evicted line"
                );
                oldest
            }
        };

        set[victim_idx] = CacheLine {
            valid: true,
            tag: addr.tag,
            inserted_at: stamp,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_derivation() {
        let cache = CacheLevel::new(1024, 64, 1).unwrap();
        assert_eq!(cache.num_sets(), 16);
        assert_eq!(cache.line_size(), 64);
        assert_eq!(cache.associativity(), 1);
    }

    #[test]
    fn test_decode_zero_address() {
        let cache = CacheLevel::new(1024, 64, 1).unwrap();
        let addr = cache.decode(0);
        assert_eq!((addr.tag, addr.index, addr.offset), (0, 0, 0));
    }

    #[test]
    fn test_decode_first_tag_boundary() {
        // 6 offset bits + 4 index bits, so 1 << 10 is the first address with
        // a non-zero tag.
        let cache = CacheLevel::new(1024, 64, 1).unwrap();
        let addr = cache.decode(1 << 10);
        assert_eq!((addr.tag, addr.index, addr.offset), (1, 0, 0));
    }

    #[test]
    fn test_geometry_rejection() {
        assert!(matches!(
            CacheLevel::new(0, 64, 1),
            Err(MemoryError::ZeroSize { .. })
        ));
        assert!(matches!(
            CacheLevel::new(1000, 64, 1),
            Err(MemoryError::IndivisibleGeometry { .. })
        ));
        // 192 bytes of 64-byte lines gives 3 sets.
        assert!(matches!(
            CacheLevel::new(192, 64, 1),
            Err(MemoryError::NotPowerOfTwo { .. })
        ));
        assert!(matches!(
            CacheLevel::new(1024, 48, 1),
            Err(MemoryError::IndivisibleGeometry { .. })
        ));
    }

    #[test]
    fn test_miss_then_hit() {
        let mut cache = CacheLevel::new(1024, 64, 1).unwrap();
        assert!(!cache.access(0x40));
        assert!(cache.access(0x40));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert!((cache.hit_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_hit_ratio_zero_without_accesses() {
        let cache = CacheLevel::new(1024, 64, 1).unwrap();
        assert_eq!(cache.hit_ratio(), 0.0);
    }

    #[test]
    fn test_flush_resets_everything() {
        let mut cache = CacheLevel::new(1024, 64, 2).unwrap();
        cache.access(0);
        cache.access(0);
        cache.flush();
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
        assert!(cache.set_lines(0).iter().all(|l| !l.valid));
        assert!(!cache.access(0));
    }
}
