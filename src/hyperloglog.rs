// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::hash::{hash_bytes, SipBuildHasher};
use crate::traits::{Mergeable, Sketch, SketchError};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::hash::BuildHasher;
use tracing::debug;

/// Smallest supported precision (16 registers)
pub const MIN_PRECISION: u8 = 4;

/// Largest supported precision (65,536 registers)
pub const MAX_PRECISION: u8 = 16;

/// 2^32, threshold base of the large range correction
const TWO_POW_32: f64 = 4_294_967_296.0;

/// 2^64, size of the hash space
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// HyperLogLog - Cardinality Estimation
///
/// A probabilistic data structure for estimating the number of distinct elements
/// (cardinality) in a stream. It uses significantly less memory than storing the elements.
///
/// # Key Properties
///
/// - **Fixed Memory**: `2^p` one-byte registers regardless of the number of elements.
/// - **Accuracy**: Relative standard error is approximately `1.04 / sqrt(2^p)`, provided the
///   hasher spreads its output bits uniformly.
/// - **Mergeable**: Registers combine by element-wise maximum.
/// - **Idempotent**: Adding the same element multiple times does not change the estimate.
///
/// # Example
///
/// ```
/// use membership_sketches::HyperLogLog;
///
/// let mut hll = HyperLogLog::new(14).unwrap();
/// hll.add("user1");
/// hll.add("user2");
/// hll.add("user3");
/// hll.add("user1"); // Duplicate
///
/// let count = hll.count();
/// assert!(count >= 2 && count <= 4); // Approximate count
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct HyperLogLog<S = SipBuildHasher> {
    /// Number of low hash bits used as the register index
    precision: u8,
    /// Bias correction constant for `2^precision` registers
    alpha: f64,
    /// Each register stores the highest rank seen for its index
    registers: Vec<u8>,
    #[serde(skip)]
    hasher: S,
}

impl HyperLogLog {
    /// Creates an empty sketch with `2^precision` registers, hashing with SipHash-1-3.
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        Self::with_hasher(precision, SipBuildHasher::default())
    }
}

impl<S: BuildHasher> HyperLogLog<S> {
    /// Creates an empty sketch hashing with `hasher`.
    ///
    /// Fails with [`SketchError::PrecisionOutOfRange`] unless `4 <= precision <= 16`.
    pub fn with_hasher(precision: u8, hasher: S) -> Result<Self, SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            debug!(precision, "rejecting hyperloglog precision");
            return Err(SketchError::PrecisionOutOfRange { precision });
        }
        Ok(Self {
            precision,
            alpha: alpha(precision),
            registers: vec![0u8; 1 << precision],
            hasher,
        })
    }

    /// Add an element to the HyperLogLog
    ///
    /// Returns `true` if the internal state changed.
    pub fn add(&mut self, item: impl AsRef<[u8]>) -> bool {
        let hash = hash_bytes(&self.hasher, item.as_ref());

        // Low `precision` bits pick the register
        let index = (hash & ((1 << self.precision) - 1)) as usize;
        let observed = rank(hash >> self.precision, 64 - self.precision);

        if observed > self.registers[index] {
            self.registers[index] = observed;
            true
        } else {
            false
        }
    }
}

impl<S> HyperLogLog<S> {
    /// Estimate the cardinality (number of distinct elements)
    pub fn count(&self) -> u64 {
        let m = self.registers.len() as f64;
        let mut sum = 0.0;
        let mut zeros = 0usize;

        for &val in &self.registers {
            if val == 0 {
                zeros += 1;
            }
            sum += 1.0 / (1u64 << val) as f64;
        }

        let raw = self.alpha * m * m / sum;

        let estimate = if raw <= 2.5 * m {
            // Small range correction (LinearCounting)
            if zeros > 0 {
                m * (m / zeros as f64).ln()
            } else {
                raw
            }
        } else if raw > TWO_POW_32 / 30.0 {
            // Large range correction
            -TWO_POW_64 * (1.0 - raw / TWO_POW_64).ln()
        } else {
            raw
        };

        estimate.round() as u64
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    /// Expected relative standard error, `1.04 / sqrt(m)`.
    pub fn standard_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }

    fn check(&self) -> Result<(), SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&self.precision) {
            return Err(SketchError::PrecisionOutOfRange {
                precision: self.precision,
            });
        }
        let expected = 1usize << self.precision;
        if self.registers.len() != expected {
            return Err(SketchError::Validation(format!(
                "Invalid register count: expected {}, got {}",
                expected,
                self.registers.len()
            )));
        }
        if (self.alpha - alpha(self.precision)).abs() > f64::EPSILON {
            return Err(SketchError::Validation(format!(
                "alpha {} does not match precision {}",
                self.alpha, self.precision
            )));
        }
        let max_rank = 64 - self.precision;
        if let Some(&bad) = self.registers.iter().find(|&&r| r > max_rank) {
            return Err(SketchError::Validation(format!(
                "register value {} exceeds maximum rank {}",
                bad, max_rank
            )));
        }
        Ok(())
    }
}

/// Persisted form, checked before it becomes a sketch.
#[derive(Deserialize)]
struct HyperLogLogState {
    precision: u8,
    alpha: f64,
    registers: Vec<u8>,
}

impl<'de, S: Default> Deserialize<'de> for HyperLogLog<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = HyperLogLogState::deserialize(deserializer)?;
        let hll = Self {
            precision: state.precision,
            alpha: state.alpha,
            registers: state.registers,
            hasher: S::default(),
        };
        hll.check().map_err(de::Error::custom)?;
        Ok(hll)
    }
}

/// Bias correction constant for `2^precision` registers.
pub fn alpha(precision: u8) -> f64 {
    match precision {
        4 => 0.673,
        5 => 0.697,
        6 => 0.709,
        p => 0.7213 / (1.0 + 1.079 / (1u64 << p) as f64),
    }
}

/// Position of the lowest set bit of `bits`, counted from 1 and capped at `max`.
fn rank(bits: u64, max: u8) -> u8 {
    (bits.trailing_zeros() + 1).min(max as u32) as u8
}

impl<S> Mergeable for HyperLogLog<S> {
    /// Element-wise maximum of the registers. Both sketches must share precision and hasher.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.precision != other.precision || self.registers.len() != other.registers.len() {
            debug!(
                self_precision = self.precision,
                other_precision = other.precision,
                self_registers = self.registers.len(),
                other_registers = other.registers.len(),
                "rejecting hyperloglog merge"
            );
            return Err(SketchError::DimensionMismatch(format!(
                "hyperloglog (p={}, {} registers) cannot merge (p={}, {} registers)",
                self.precision,
                self.registers.len(),
                other.precision,
                other.registers.len()
            )));
        }
        for (mine, &theirs) in self.registers.iter_mut().zip(&other.registers) {
            *mine = (*mine).max(theirs);
        }
        Ok(())
    }
}

impl<S> Sketch for HyperLogLog<S>
where
    S: BuildHasher + Clone + Default + Send + Sync,
{
    fn validate(&self) -> Result<(), SketchError> {
        self.check()
    }

    fn is_empty(&self) -> bool {
        self.registers.iter().all(|&x| x == 0)
    }

    fn clear(&mut self) {
        self.registers.iter_mut().for_each(|r| *r = 0);
    }
}
