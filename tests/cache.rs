//! Integration tests for the cache level and the two-level hierarchy
//!
//! Covers address decoding, FIFO-by-insertion victim selection, fill
//! idempotence, and the hierarchy's inclusive refill protocol with its
//! counter identity.

use memsim::cache::{CacheHierarchy, CacheLevel};

/// Within any set, distinct valid lines must carry distinct tags.
fn assert_distinct_tags(cache: &CacheLevel) {
    for index in 0..cache.num_sets() {
        let lines = cache.set_lines(index);
        for (i, a) in lines.iter().enumerate() {
            for b in &lines[i + 1..] {
                if a.valid && b.valid {
                    assert_ne!(a.tag, b.tag, "duplicate tag in set {index}");
                }
            }
        }
    }
}

#[test]
fn test_counters_match_access_count() {
    let mut cache = CacheLevel::new(1024, 64, 2).unwrap();
    let addresses = [0x0, 0x40, 0x0, 0x1000, 0x40, 0x2000, 0x0];
    for &addr in &addresses {
        cache.access(addr);
    }
    assert_eq!(cache.hits() + cache.misses(), addresses.len() as u64);
    assert_distinct_tags(&cache);
}

#[test]
fn test_direct_mapped_conflict_evicts() {
    // 1024 bytes of 64-byte lines, direct mapped: 16 sets.
    let mut cache = CacheLevel::new(1024, 64, 1).unwrap();
    assert_eq!(cache.num_sets(), 16);

    assert!(!cache.access(0x0000));
    assert!(cache.access(0x0000));
    // 0x400 shares set 0 with 0x0000.
    assert!(!cache.access(0x0400));
    assert!(!cache.access(0x0000));
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 3);
}

#[test]
fn test_victim_is_oldest_insertion_not_least_recent_use() {
    // One set, two ways.
    let mut cache = CacheLevel::new(128, 64, 2).unwrap();
    assert_eq!(cache.num_sets(), 1);

    cache.access(0x000); // install A
    cache.access(0x080); // install B
    assert!(cache.access(0x000)); // hit A, which must not refresh it

    cache.access(0x100); // C evicts A, the oldest insertion
    assert!(!cache.access(0x000), "A should have been evicted");
    assert!(cache.access(0x100) || cache.access(0x080));
    assert_distinct_tags(&cache);
}

#[test]
fn test_fill_is_idempotent_on_same_tag() {
    let mut cache = CacheLevel::new(1024, 64, 4).unwrap();
    cache.fill(0x40);
    cache.fill(0x40);

    let index = cache.decode(0x40).index;
    let tag = cache.decode(0x40).tag;
    let matching = cache
        .set_lines(index)
        .iter()
        .filter(|l| l.valid && l.tag == tag)
        .count();
    assert_eq!(matching, 1);

    // Fill never touches the counters.
    assert_eq!(cache.hits(), 0);
    assert_eq!(cache.misses(), 0);
}

#[test]
fn test_repeated_fill_refreshes_insertion_time() {
    // One set, two ways: refreshing A's timestamp must make B the victim.
    let mut cache = CacheLevel::new(128, 64, 2).unwrap();
    cache.fill(0x000); // A
    cache.fill(0x080); // B
    cache.fill(0x000); // A again, now newer than B

    cache.fill(0x100); // C must evict B
    assert!(cache.access(0x000));
    assert_distinct_tags(&cache);
}

#[test]
fn test_hierarchy_counter_identity_holds() {
    let l1 = CacheLevel::new(256, 64, 1).unwrap();
    let l2 = CacheLevel::new(1024, 64, 2).unwrap();
    let mut caches = CacheHierarchy::new(l1, l2);

    // A deterministic walk with reuse and conflicts.
    let mut address = 0u64;
    for step in 0..200 {
        address = (address * 29 + step * 61) % 0x4000;
        caches.access(address & !0x3F);
    }
    assert_eq!(caches.l2_hits() + caches.l2_misses(), caches.l1_misses());
}

#[test]
fn test_l2_hit_refills_l1() {
    // L1: 4 sets direct mapped; L2: 8 sets, 2-way.
    let l1 = CacheLevel::new(256, 64, 1).unwrap();
    let l2 = CacheLevel::new(1024, 64, 2).unwrap();
    let mut caches = CacheHierarchy::new(l1, l2);

    let a = 0x000;
    let b = 0x100; // conflicts with A in L1, lands in another L2 set

    assert!(!caches.access(a));
    assert!(caches.access(a));
    assert!(!caches.access(b));
    // A was evicted from L1 by B, but L2 still holds it.
    assert!(caches.access(a));

    assert_eq!(caches.l1_hits(), 1);
    assert_eq!(caches.l1_misses(), 3);
    assert_eq!(caches.l2_hits(), 1);
    assert_eq!(caches.l2_misses(), 2);

    // The refill put A back, so it now hits in L1.
    assert!(caches.access(a));
    assert_eq!(caches.l1_hits(), 2);
}
