// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use membership_sketches::*;

#[test]
fn test_bloom_filter_no_false_negatives() {
    let mut bf = BloomFilter::new(100, 4);
    bf.add("foo");
    bf.add("bar");
    bf.add("baz");

    assert!(bf.contains("foo"));
    assert!(bf.contains("bar"));
    assert!(bf.contains("baz"));
}

#[test]
fn test_bloom_filter_accepts_bytes_and_strings() {
    let mut bf = BloomFilter::new(256, 3);
    bf.add(b"raw".as_slice());
    bf.add(String::from("owned"));

    assert!(bf.contains("raw"));
    assert!(bf.contains(b"owned".to_vec()));
}

#[test]
fn test_bloom_filter_merge() {
    let mut a = BloomFilter::new(512, 5);
    a.add("apple");
    let mut b = BloomFilter::new(512, 5);
    b.add("banana");

    a.merge(&b).unwrap();
    assert!(a.contains("apple"));
    assert!(a.contains("banana"));
}

#[test]
fn test_bloom_filter_merge_mismatch() {
    let mut a = BloomFilter::new(512, 5);
    let b = BloomFilter::new(512, 4);
    let c = BloomFilter::new(256, 5);

    assert!(matches!(a.merge(&b), Err(SketchError::DimensionMismatch(_))));
    assert!(matches!(a.merge(&c), Err(SketchError::DimensionMismatch(_))));
}

#[test]
fn test_bloom_filter_with_rate() {
    let bf = BloomFilter::with_rate(1000, 0.01);
    assert_eq!(bf.num_bits(), bit_set_size(1000, 0.01));
    assert_eq!(bf.num_hashes(), 6);
    assert!(bf.is_empty());
}

#[test]
fn test_cuckoo_filter_add() {
    let mut cf = CuckooFilter::new(1000);

    assert!(cf.add("one"));
    assert!(cf.add("two"));
    assert!(cf.add("three"));
    assert!(cf.add("four"));
}

#[test]
fn test_cuckoo_filter_contains() {
    let mut cf = CuckooFilter::with_hasher(1000, FnvBuildHasher::default());

    cf.add("one");
    cf.add("two");
    cf.add("three");
    cf.add("four");

    assert!(cf.contains("one"));
    assert!(cf.contains("two"));
    assert!(cf.contains("three"));
    assert!(cf.contains("four"));

    assert!(!cf.contains("five"));
}

#[test]
fn test_cuckoo_filter_delete() {
    let mut cf = CuckooFilter::new(1000);
    cf.add("one");
    cf.add("two");

    assert!(cf.delete("one"));
    assert!(!cf.contains("one"));
    assert!(cf.contains("two"));

    assert!(!cf.delete("one"));
    assert!(!cf.delete("never-added"));
    assert_eq!(cf.len(), 1);
}

#[test]
fn test_cuckoo_filter_idempotent_add() {
    let mut cf = CuckooFilter::new(64);
    assert!(cf.add("x"));
    let snapshot = cf.clone();

    assert!(cf.add("x"));
    assert_eq!(cf, snapshot);
    assert_eq!(cf.len(), 1);
}

#[test]
fn test_cuckoo_filter_defaults() {
    let cf = CuckooFilter::new(10);
    assert_eq!(cf.capacity(), 10);
    assert_eq!(cf.max_kicks(), 500);
    assert_eq!(cf.with_max_kicks(3).max_kicks(), 3);
}

#[test]
fn test_hyperloglog_precision_bounds() {
    assert_eq!(
        HyperLogLog::new(3).unwrap_err(),
        SketchError::PrecisionOutOfRange { precision: 3 }
    );
    assert_eq!(
        HyperLogLog::new(17).unwrap_err(),
        SketchError::PrecisionOutOfRange { precision: 17 }
    );
    assert!(HyperLogLog::new(4).is_ok());
    assert!(HyperLogLog::new(16).is_ok());
}

#[test]
fn test_hyperloglog_repeated_stream() {
    let mut hll = HyperLogLog::new(4).unwrap();

    // 1000 repetitions of 13 distinct items
    for _ in 0..1000 {
        for c in b'a'..=b'm' {
            hll.add([c]);
        }
    }

    let count = hll.count() as i64;
    assert!((count - 13).abs() < 10, "count={count}");
}

#[test]
fn test_hyperloglog_merge() {
    let mut hll1 = HyperLogLog::new(14).unwrap();
    hll1.add("user1");
    hll1.add("user2");

    let mut hll2 = HyperLogLog::new(14).unwrap();
    hll2.add("user2");
    hll2.add("user3");

    hll1.merge(&hll2).unwrap();

    let count = hll1.count();
    assert!(count >= 3 && count <= 4); // Should be around 3
}

#[test]
fn test_hyperloglog_merge_mismatch() {
    let mut a = HyperLogLog::new(10).unwrap();
    let b = HyperLogLog::new(11).unwrap();
    assert!(matches!(a.merge(&b), Err(SketchError::DimensionMismatch(_))));
}

#[test]
fn test_hyperloglog_clear() {
    let mut hll = HyperLogLog::new(8).unwrap();
    hll.add("x");
    assert!(!hll.is_empty());
    hll.clear();
    assert!(hll.is_empty());
    assert_eq!(hll.count(), 0);
}
