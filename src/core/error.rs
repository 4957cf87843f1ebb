//! Crate-wide error and result types.
//!
//! Only two kinds of failure are errors here: geometry that is rejected at
//! construction, and a translation of a virtual page number that lies outside
//! the page table. Allocation failure is not an error; the allocators report
//! it as `None` so the caller can retry with a smaller request or free
//! something first.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Errors reported by the simulation engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// A dimension that must be positive was zero.
    #[error("{what} must be non-zero")]
    ZeroSize {
        /// Which dimension was zero.
        what: &'static str,
    },

    /// A size that must be a power of two was not.
    #[error("{what} must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Which size was rejected.
        what: &'static str,
        /// The offending value.
        value: usize,
    },

    /// Cache geometry that does not divide evenly into sets.
    #[error(
        "cache size {cache_size} is not divisible by \
         line size {line_size} times associativity {associativity}"
    )]
    IndivisibleGeometry {
        cache_size: usize,
        line_size: usize,
        associativity: usize,
    },

    /// A virtual page number beyond the end of the page table.
    #[error("virtual page {vpn} is out of range for a page table of {num_pages} pages")]
    VpnOutOfRange { vpn: usize, num_pages: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MemoryError::NotPowerOfTwo {
            what: "page size",
            value: 1000,
        };
        assert_eq!(err.to_string(), "page size must be a power of two, got 1000");

        let err = MemoryError::VpnOutOfRange {
            vpn: 70,
            num_pages: 64,
        };
        assert!(err.to_string().contains("out of range"));
    }
}
