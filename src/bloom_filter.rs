// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::hash::{hash_with_seed, SipBuildHasher};
use crate::traits::{Mergeable, Sketch, SketchError};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::f64::consts::LN_2;
use std::hash::BuildHasher;
use tracing::{debug, warn};

/// Number of distinct probes an item can have. Probes are seeded with a single byte.
pub const MAX_HASH_FUNCTIONS: usize = 256;

const WORD_BITS: usize = u64::BITS as usize;

/// Bloom Filter - Approximate Membership
///
/// A fixed-size bit array probed by `k` hash functions. A query answers either
/// "definitely absent" or "possibly present".
///
/// # Key Properties
///
/// - **No False Negatives**: Once added, an item is reported present for the life of the filter.
/// - **Tunable False Positives**: The rate is governed by the bit count `m`, the probe count `k`
///   and the number of items added. See [`bit_set_size`] and [`num_hash_functions`].
/// - **No Deletion**: Bits are only ever set. Use [`CuckooFilter`](crate::CuckooFilter) when
///   items must be removed.
///
/// The `i`-th probe of an item hashes the item bytes followed by the seed byte `i`, so at most
/// [`MAX_HASH_FUNCTIONS`] probes are distinct. A larger `k` reuses seeds.
///
/// # Choosing a Hasher
///
/// Probes only differ in their trailing seed byte, so the hasher must mix that byte into every
/// output bit. [`FnvBuildHasher`](crate::FnvBuildHasher) does not: its digests of one item
/// under neighbouring seeds differ by a small multiple of the FNV prime, which leaves the
/// probes strongly correlated. A filter sized for 1% measured about 20% false positives with
/// FNV against 1% with the SipHash-1-3 default.
///
/// # Example
///
/// ```
/// use membership_sketches::BloomFilter;
///
/// let mut filter = BloomFilter::new(100, 4);
/// filter.add("foo");
/// filter.add("bar");
///
/// assert!(filter.contains("foo"));
/// assert!(filter.contains("bar"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct BloomFilter<S = SipBuildHasher> {
    /// Bit array packed into words, least significant bit first
    bits: Vec<u64>,
    /// Bitset size `m`
    num_bits: usize,
    /// Probes per item `k`
    num_hashes: usize,
    #[serde(skip)]
    hasher: S,
}

impl BloomFilter {
    /// Creates a filter of `num_bits` cleared bits probed `num_hashes` times per item,
    /// hashing with SipHash-1-3.
    ///
    /// # Panics
    ///
    /// `num_bits` must be non-zero; a zero-sized filter panics on the first probe.
    pub fn new(num_bits: usize, num_hashes: usize) -> Self {
        Self::with_hasher(num_bits, num_hashes, SipBuildHasher::default())
    }

    /// Creates a filter sized for `num_items` items at the given false positive rate.
    pub fn with_rate(num_items: usize, false_positive_rate: f64) -> Self {
        let num_bits = bit_set_size(num_items, false_positive_rate).max(1);
        let num_hashes = num_hash_functions(num_bits, num_items.max(1));
        Self::new(num_bits, num_hashes)
    }
}

impl<S: BuildHasher> BloomFilter<S> {
    /// Creates a filter hashing with `hasher`.
    pub fn with_hasher(num_bits: usize, num_hashes: usize, hasher: S) -> Self {
        if num_hashes > MAX_HASH_FUNCTIONS {
            warn!(
                num_hashes,
                max = MAX_HASH_FUNCTIONS,
                "bloom filter probe count exceeds distinct seeds; probes will repeat"
            );
        }
        Self {
            bits: vec![0; num_bits.div_ceil(WORD_BITS)],
            num_bits,
            num_hashes,
            hasher,
        }
    }

    /// Records `item`. Always succeeds.
    pub fn add(&mut self, item: impl AsRef<[u8]>) {
        let item = item.as_ref();
        for i in 0..self.num_hashes {
            let bit = self.probe(item, i);
            self.bits[bit / WORD_BITS] |= 1 << (bit % WORD_BITS);
        }
    }

    /// Returns `false` if `item` was definitely never added, `true` if it may have been.
    pub fn contains(&self, item: impl AsRef<[u8]>) -> bool {
        let item = item.as_ref();
        (0..self.num_hashes).all(|i| {
            let bit = self.probe(item, i);
            self.bits[bit / WORD_BITS] & (1 << (bit % WORD_BITS)) != 0
        })
    }

    fn probe(&self, item: &[u8], i: usize) -> usize {
        // Seeds wrap past MAX_HASH_FUNCTIONS.
        (hash_with_seed(&self.hasher, item, i as u8) % self.num_bits as u64) as usize
    }
}

impl<S> BloomFilter<S> {
    /// Bitset size `m`.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Probes per item `k`.
    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Expected false positive rate once `num_items` distinct items have been added:
    /// `(1 - e^(-k·n/m))^k`.
    pub fn estimated_false_positive_rate(&self, num_items: usize) -> f64 {
        let k = self.num_hashes as f64;
        let exponent = -k * num_items as f64 / self.num_bits as f64;
        (1.0 - exponent.exp()).powf(k)
    }

    fn check(&self) -> Result<(), SketchError> {
        if self.num_bits == 0 || self.num_hashes == 0 {
            return Err(SketchError::Validation(format!(
                "bloom filter needs m > 0 and k > 0, got m={}, k={}",
                self.num_bits, self.num_hashes
            )));
        }
        let expected_words = self.num_bits.div_ceil(WORD_BITS);
        if self.bits.len() != expected_words {
            return Err(SketchError::Validation(format!(
                "Invalid word count: expected {}, got {}",
                expected_words,
                self.bits.len()
            )));
        }
        let tail = self.num_bits % WORD_BITS;
        if tail != 0 {
            let last = self.bits[expected_words - 1];
            if last >> tail != 0 {
                return Err(SketchError::Validation(
                    "bits set beyond the end of the bitset".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Persisted form, checked before it becomes a filter.
#[derive(Deserialize)]
struct BloomFilterState {
    bits: Vec<u64>,
    num_bits: usize,
    num_hashes: usize,
}

impl<'de, S: Default> Deserialize<'de> for BloomFilter<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = BloomFilterState::deserialize(deserializer)?;
        let filter = Self {
            bits: state.bits,
            num_bits: state.num_bits,
            num_hashes: state.num_hashes,
            hasher: S::default(),
        };
        filter.check().map_err(de::Error::custom)?;
        Ok(filter)
    }
}

/// Bitset size for `num_items` items at `false_positive_rate`: `ceil(-n·ln(p) / (ln 2)²)`.
///
/// Advisory only, [`BloomFilter::new`] never calls it. Degenerate inputs (`p >= 1`, `p` not a
/// number, `n == 0`) yield 0.
pub fn bit_set_size(num_items: usize, false_positive_rate: f64) -> usize {
    let size = -(num_items as f64) * false_positive_rate.ln() / (LN_2 * LN_2);
    // Saturating cast: negative and NaN become 0.
    size.ceil() as usize
}

/// Probe count for a bitset of `bit_set_size` bits holding `num_items` items:
/// `(m / n)·ln 2`, truncated and clamped to `1..=MAX_HASH_FUNCTIONS`.
///
/// The clamp departs from the bare formula at both ends. A bitset too small for its items
/// still gets one probe, so `(10, 100)` gives 1 where the formula truncates to 0, and a very
/// sparse one stops at the 256 distinct seeds.
pub fn num_hash_functions(bit_set_size: usize, num_items: usize) -> usize {
    let k = bit_set_size as f64 / num_items as f64 * LN_2;
    (k as usize).clamp(1, MAX_HASH_FUNCTIONS)
}

impl<S> Mergeable for BloomFilter<S> {
    /// Union: an item present in either filter is present in the result.
    ///
    /// Both filters must share `m`, `k` and the same hasher; only the first two can be checked.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.num_bits != other.num_bits || self.num_hashes != other.num_hashes {
            debug!(
                self_bits = self.num_bits,
                other_bits = other.num_bits,
                self_hashes = self.num_hashes,
                other_hashes = other.num_hashes,
                "rejecting bloom filter merge"
            );
            return Err(SketchError::DimensionMismatch(format!(
                "bloom filter (m={}, k={}) cannot merge (m={}, k={})",
                self.num_bits, self.num_hashes, other.num_bits, other.num_hashes
            )));
        }
        for (word, &theirs) in self.bits.iter_mut().zip(&other.bits) {
            *word |= theirs;
        }
        Ok(())
    }
}

impl<S> Sketch for BloomFilter<S>
where
    S: BuildHasher + Clone + Default + Send + Sync,
{
    fn validate(&self) -> Result<(), SketchError> {
        self.check()
    }

    fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    fn clear(&mut self) {
        self.bits.iter_mut().for_each(|w| *w = 0);
    }
}
