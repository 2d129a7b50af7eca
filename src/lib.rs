//! # membership-sketches
//!
//! Probabilistic sketches for approximate set membership and cardinality estimation.
//!
//! - [`BloomFilter`]: membership with no false negatives and no deletion.
//! - [`CuckooFilter`]: membership with deletion and bounded insertion cost.
//! - [`HyperLogLog`]: distinct-count estimation in fixed memory.
//!
//! None of the sketches synchronize internally. Wrap an instance in a lock to share it
//! between writers.

pub mod bloom_filter;
pub mod cuckoo_filter;
pub mod hash;
pub mod hyperloglog;
pub mod traits;

// Re-export core traits
pub use traits::{Mergeable, Sketch, SketchError};

pub use bloom_filter::{bit_set_size, num_hash_functions, BloomFilter};
pub use cuckoo_filter::CuckooFilter;
pub use hash::{FnvBuildHasher, SipBuildHasher};
pub use hyperloglog::HyperLogLog;
