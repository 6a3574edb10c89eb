//! Error types for judgement-core.
//!
//! Two kinds of failure exist in this crate and only one of them is an error:
//!
//! - **Validation failures** (empty vectors, dimension mismatches, non-finite
//!   elements, malformed policy thresholds) are integration bugs. They are
//!   raised as typed [`CoreError`] variants and propagate to the caller.
//! - **Numeric degeneracy** (zero-magnitude vectors in cosine, zero-sum
//!   distributions in KL/EMD) is expected data. Metrics resolve those cases
//!   to documented fallback values and never return an error for them.

use thiserror::Error;

use crate::metrics::MetricKind;

/// Result alias for judgement-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Unified error type for the relative-judgement core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// An empty vector was passed to a distance metric.
    #[error("empty vector passed to distance metric")]
    EmptyVector,

    /// Vectors of different lengths were passed to a distance metric.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the expected-pattern vector
        expected: usize,
        /// Dimension of the actual-pattern vector
        actual: usize,
    },

    /// A vector element was NaN or infinite.
    #[error("non-finite element at index {index}: {value}")]
    NonFiniteElement {
        /// Index of the offending element
        index: usize,
        /// The offending value
        value: f32,
    },

    /// A pattern had an empty body.
    #[error("{side} pattern has an empty body")]
    EmptyPattern {
        /// Which side of the judgement the pattern came from
        side: &'static str,
    },

    /// A difference magnitude was negative or non-finite.
    #[error("invalid difference magnitude: {value}")]
    InvalidMagnitude {
        /// The rejected magnitude
        value: f32,
    },

    /// Skip thresholds were not strictly ordered.
    #[error("invalid skip thresholds: low={low}, high={high} (require 0 <= low < high)")]
    InvalidThresholds {
        /// Lower (full-skip) threshold
        low: f32,
        /// Upper (focused-calculation) threshold
        high: f32,
    },

    /// Learning-rate policy bounds were malformed.
    #[error("invalid rate bounds: base={base}, max={max} (require 0 < base <= max)")]
    InvalidRateBounds {
        /// Base learning rate
        base: f32,
        /// Maximum learning rate
        max: f32,
    },

    /// A burst was constructed with an amplification below 1.
    #[error("invalid burst amplification: {value} (require >= 1)")]
    InvalidAmplification {
        /// The rejected amplification factor
        value: f32,
    },

    /// A burst was constructed with a non-positive half-life.
    #[error("invalid burst half-life: {millis}ms (require > 0)")]
    InvalidHalfLife {
        /// The rejected half-life in milliseconds
        millis: u64,
    },

    /// A metric kind was not present in the registry.
    #[error("no metric registered for kind {kind:?}")]
    UnknownMetric {
        /// The unregistered kind
        kind: MetricKind,
    },

    /// A layer id was not found in the manager registry.
    #[error("unknown layer: {id}")]
    UnknownLayer {
        /// The missing layer id
        id: String,
    },

    /// A link id was not found in the manager registry.
    #[error("unknown link: {id}")]
    UnknownLink {
        /// The missing link id
        id: String,
    },

    /// A target layer rejected a learning signal.
    #[error("layer {id} rejected update: {message}")]
    LayerUpdate {
        /// The target layer id
        id: String,
        /// Reason reported by the layer
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the violation
        message: String,
    },
}
