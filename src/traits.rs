// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Error type for sketch operations
#[derive(Debug, Error, PartialEq)]
pub enum SketchError {
    #[error("Precision out of range: {precision} (expected 4..=16)")]
    PrecisionOutOfRange { precision: u8 },
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Core sketch trait - state that can be checked, reset and persisted.
///
/// The hasher of a sketch is never part of its persisted form. A restored sketch
/// rebuilds its hasher with `Default`, so state must be restored into a sketch type
/// using the same hasher it was built with.
pub trait Sketch: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Validates the internal consistency of the sketch state.
    ///
    /// Called by [`Sketch::from_bytes`] before a restored sketch is handed out.
    fn validate(&self) -> Result<(), SketchError>;

    /// Returns true if nothing has been recorded.
    fn is_empty(&self) -> bool;

    /// Returns the sketch to its freshly constructed state, keeping its parameters.
    fn clear(&mut self);

    /// Serializes the sketch with bincode.
    fn to_bytes(&self) -> Result<Vec<u8>, SketchError> {
        bincode::serialize(self).map_err(|e| SketchError::Serialization(e.to_string()))
    }

    /// Deserializes and validates a sketch produced by [`Sketch::to_bytes`].
    fn from_bytes(bytes: &[u8]) -> Result<Self, SketchError>
    where
        Self: Sized,
    {
        let sketch: Self = bincode::deserialize(bytes)
            .map_err(|e: bincode::Error| SketchError::Deserialization(e.to_string()))?;
        sketch.validate()?;
        Ok(sketch)
    }
}

/// Sketches whose states can be combined into the sketch of the combined input.
///
/// # Requirements
///
/// Implementations must satisfy the following algebraic properties:
/// - **Commutativity**: `a.merge(b) == b.merge(a)`
/// - **Associativity**: `(a.merge(b)).merge(c) == a.merge(b.merge(c))`
/// - **Idempotence**: `a.merge(a) == a`
pub trait Mergeable {
    /// Folds `other` into `self`. Fails without modifying `self` when the shapes differ.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError>;
}
