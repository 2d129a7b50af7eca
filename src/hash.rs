// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Hash capability shared by the sketches.
//!
//! Every sketch takes a [`BuildHasher`] rather than a stateful hash object. Each digest
//! is computed on a fresh hasher, so hashing is a pure `(bytes, seed) -> u64` function
//! and a sketch holds no hidden hash state between calls.

use siphasher::sip::SipHasher13;
use std::hash::{BuildHasher, Hasher};

/// FNV-1a (64-bit), a cheaper hasher than the SipHash-1-3 default.
pub use fnv::FnvBuildHasher;

/// Digest of `bytes` with no seed.
pub fn hash_bytes<S: BuildHasher>(build: &S, bytes: &[u8]) -> u64 {
    let mut hasher = build.build_hasher();
    hasher.write(bytes);
    hasher.finish()
}

/// Digest of `bytes` followed by a single seed byte.
///
/// This is how probes are derived: the `i`-th probe of an item hashes the item with
/// `seed = i`. With one seed byte there are only 256 distinct probes per item.
pub fn hash_with_seed<S: BuildHasher>(build: &S, bytes: &[u8], seed: u8) -> u64 {
    let mut hasher = build.build_hasher();
    hasher.write(bytes);
    hasher.write_u8(seed);
    hasher.finish()
}

/// SipHash-1-3 keyed with `(k0, k1)`. Default hasher of every sketch.
///
/// The default keys are zero so that estimates are reproducible across processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SipBuildHasher {
    k0: u64,
    k1: u64,
}

impl SipBuildHasher {
    pub fn new_with_keys(k0: u64, k1: u64) -> Self {
        Self { k0, k1 }
    }
}

impl BuildHasher for SipBuildHasher {
    type Hasher = SipHasher13;

    fn build_hasher(&self) -> SipHasher13 {
        SipHasher13::new_with_keys(self.k0, self.k1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv_matches_reference_vector() {
        // FNV-1a 64 of "a"
        assert_eq!(hash_bytes(&FnvBuildHasher::default(), b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_seed_changes_digest() {
        let build = FnvBuildHasher::default();
        let d0 = hash_with_seed(&build, b"item", 0);
        let d1 = hash_with_seed(&build, b"item", 1);
        assert_ne!(d0, d1);
        assert_eq!(d0, hash_with_seed(&build, b"item", 0));
    }

    #[test]
    fn test_fnv_seed_bytes_shift_digest_by_prime() {
        const FNV_PRIME: u64 = 0x100000001b3;
        let build = FnvBuildHasher::default();
        for item in [&b"a"[..], b"item", b"another item"] {
            let d0 = hash_with_seed(&build, item, 0);
            let diff = hash_with_seed(&build, item, 1).wrapping_sub(d0);
            assert!(diff == FNV_PRIME || diff == FNV_PRIME.wrapping_neg());
        }
    }

    #[test]
    fn test_sip_keys_matter() {
        let a = SipBuildHasher::default();
        let b = SipBuildHasher::new_with_keys(1, 2);
        assert_ne!(hash_bytes(&a, b"item"), hash_bytes(&b, b"item"));
        assert_eq!(hash_bytes(&a, b"item"), hash_bytes(&SipBuildHasher::default(), b"item"));
    }
}
