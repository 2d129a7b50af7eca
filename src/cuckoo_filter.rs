// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::hash::{hash_with_seed, SipBuildHasher};
use crate::traits::{Sketch, SketchError};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::hash::BuildHasher;
use tracing::{debug, trace};

/// Relocation bound used by [`CuckooFilter::new`].
pub const DEFAULT_MAX_KICKS: usize = 500;

/// Width of a stored fingerprint.
pub const FINGERPRINT_BITS: u32 = 32;

const FINGERPRINT_MASK: u64 = (1 << FINGERPRINT_BITS) - 1;

/// Cuckoo Filter - Approximate Membership with Deletion
///
/// A fixed array of buckets, each empty or holding one 32-bit fingerprint. Every item has
/// two candidate buckets: `h1 = hash(item, 0)` and `h2 = hash(item, h1)`, the second hash
/// seeded by the first.
///
/// # Key Properties
///
/// - **Deletion**: [`delete`](Self::delete) clears the matching candidate bucket.
/// - **Bounded Insertion**: When both candidates are taken, up to `max_kicks` swaps are
///   tried. If no empty bucket turns up, [`add`](Self::add) returns `false` and the filter is
///   left exactly as it was.
/// - **One Fingerprint per Bucket**: Unlike multi-slot cuckoo filters, a bucket never
///   holds more than one fingerprint. Load factor is lower and the false positive rate higher.
///
/// # Eviction Walk
///
/// The new fingerprint takes `h1` and its occupant is carried to `hash(item, h1)`, the bucket
/// the *inserting* item's seeded hash points at. Every later kick goes to that same bucket,
/// which is `h2`, so the walk only trades fingerprints between the two candidates of the new
/// item. With one slot per bucket it cannot free either of them: once both candidates are
/// taken the add is rejected and rolled back. In exchange no stored
/// fingerprint ever leaves the bucket it was placed in, and every accepted item stays
/// reachable until it is deleted. The cost is capacity: with SipHash-1-3, a 1000-bucket
/// filter already rejects about 2% of its first 300 distinct items.
///
/// # Example
///
/// ```
/// use membership_sketches::CuckooFilter;
///
/// let mut filter = CuckooFilter::new(1000);
/// assert!(filter.add("one"));
/// assert!(filter.contains("one"));
///
/// assert!(filter.delete("one"));
/// assert!(!filter.contains("one"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct CuckooFilter<S = SipBuildHasher> {
    buckets: Vec<Option<u32>>,
    max_kicks: usize,
    #[serde(skip)]
    hasher: S,
}

impl CuckooFilter {
    /// Creates a filter of `size` empty buckets hashing with SipHash-1-3.
    ///
    /// # Panics
    ///
    /// `size` must be non-zero; a zero-sized filter panics on first use.
    pub fn new(size: usize) -> Self {
        Self::with_hasher(size, SipBuildHasher::default())
    }
}

impl<S: BuildHasher> CuckooFilter<S> {
    /// Creates a filter hashing with `hasher`.
    pub fn with_hasher(size: usize, hasher: S) -> Self {
        Self {
            buckets: vec![None; size],
            max_kicks: DEFAULT_MAX_KICKS,
            hasher,
        }
    }

    /// Overrides the relocation bound.
    pub fn with_max_kicks(mut self, max_kicks: usize) -> Self {
        self.max_kicks = max_kicks;
        self
    }

    /// Returns true if a candidate bucket of `item` holds its fingerprint.
    pub fn contains(&self, item: impl AsRef<[u8]>) -> bool {
        let (h1, h2, fingerprint) = self.candidates(item.as_ref());
        self.holds(h1, fingerprint) || self.holds(h2, fingerprint)
    }

    /// Records `item`.
    ///
    /// Returns `true` when the item is present afterwards, including when it already was.
    /// Returns `false` when no bucket could be freed within `max_kicks` relocations; the
    /// filter is then unchanged and the caller decides whether to rebuild it larger.
    pub fn add(&mut self, item: impl AsRef<[u8]>) -> bool {
        let item = item.as_ref();
        let (h1, h2, fingerprint) = self.candidates(item);

        if self.holds(h1, fingerprint) || self.holds(h2, fingerprint) {
            return true;
        }

        for index in [h1, h2] {
            if self.buckets[index].is_none() {
                self.buckets[index] = Some(fingerprint);
                return true;
            }
        }

        self.relocate(item, h1, fingerprint)
    }

    /// Removes `item`'s fingerprint from whichever candidate bucket holds it.
    ///
    /// Returns `false` if neither does, which means the item was never added, its add was
    /// rejected, or it was already deleted.
    pub fn delete(&mut self, item: impl AsRef<[u8]>) -> bool {
        let (h1, h2, fingerprint) = self.candidates(item.as_ref());
        for index in [h1, h2] {
            if self.holds(index, fingerprint) {
                self.buckets[index] = None;
                return true;
            }
        }
        false
    }

    /// Eviction walk. Both candidates are occupied on entry.
    fn relocate(&mut self, item: &[u8], h1: usize, fingerprint: u32) -> bool {
        // Every hop is seeded by h1, so every hop lands on h2.
        let hop = self.index(hash_with_seed(&self.hasher, item, h1 as u8));
        let mut carried = self.buckets[h1].replace(fingerprint);
        let mut path = vec![h1];

        for kick in 0..self.max_kicks {
            if self.buckets[hop].is_none() {
                self.buckets[hop] = carried;
                trace!(kicks = kick + 1, bucket = hop, "cuckoo relocation settled");
                return true;
            }
            carried = std::mem::replace(&mut self.buckets[hop], carried);
            path.push(hop);
        }

        // Undo the swaps newest first; the new fingerprint ends up back in `carried`.
        for &index in path.iter().rev() {
            std::mem::swap(&mut carried, &mut self.buckets[index]);
        }
        debug!(
            max_kicks = self.max_kicks,
            occupied = self.len(),
            capacity = self.buckets.len(),
            "cuckoo filter insertion exhausted relocation bound"
        );
        false
    }

    fn candidates(&self, item: &[u8]) -> (usize, usize, u32) {
        let digest = hash_with_seed(&self.hasher, item, 0);
        let h1 = self.index(digest);
        let h2 = self.index(hash_with_seed(&self.hasher, item, h1 as u8));
        (h1, h2, (digest & FINGERPRINT_MASK) as u32)
    }

    fn index(&self, digest: u64) -> usize {
        (digest % self.buckets.len() as u64) as usize
    }
}

impl<S> CuckooFilter<S> {
    /// Number of occupied buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().filter(|b| b.is_some()).count()
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Option::is_none)
    }

    /// Fraction of occupied buckets.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.buckets.len() as f64
    }

    pub fn is_full(&self) -> bool {
        self.buckets.iter().all(Option::is_some)
    }

    pub fn max_kicks(&self) -> usize {
        self.max_kicks
    }

    fn holds(&self, index: usize, fingerprint: u32) -> bool {
        self.buckets[index] == Some(fingerprint)
    }

    fn check(&self) -> Result<(), SketchError> {
        if self.buckets.is_empty() {
            return Err(SketchError::Validation(
                "cuckoo filter needs at least one bucket".to_string(),
            ));
        }
        Ok(())
    }
}

/// Persisted form, checked before it becomes a filter.
#[derive(Deserialize)]
struct CuckooFilterState {
    buckets: Vec<Option<u32>>,
    max_kicks: usize,
}

impl<'de, S: Default> Deserialize<'de> for CuckooFilter<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = CuckooFilterState::deserialize(deserializer)?;
        let filter = Self {
            buckets: state.buckets,
            max_kicks: state.max_kicks,
            hasher: S::default(),
        };
        filter.check().map_err(de::Error::custom)?;
        Ok(filter)
    }
}

impl<S> Sketch for CuckooFilter<S>
where
    S: BuildHasher + Clone + Default + Send + Sync,
{
    fn validate(&self) -> Result<(), SketchError> {
        self.check()
    }

    fn is_empty(&self) -> bool {
        CuckooFilter::is_empty(self)
    }

    fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|b| *b = None);
    }
}
