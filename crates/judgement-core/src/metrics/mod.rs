//! Distance metrics quantifying divergence between patterns.
//!
//! All metrics share one contract: two equal-length, finite, non-empty
//! vectors in, a scalar divergence out. Input validation is strict and
//! produces named [`CoreError`] variants; numeric degeneracy inside a valid
//! input (zero vectors, zero-sum distributions) resolves to documented
//! fallback values instead.
//!
//! # Metrics
//!
//! | Metric | Range | Notes |
//! |--------|-------|-------|
//! | [`L2Distance`]       | `[0, ∞)` | Euclidean |
//! | [`CosineDistance`]   | `[0, 2]` | `1 − cos_sim` |
//! | [`KlDivergence`]     | `[0, ∞)` | asymmetric, expected = P |
//! | [`EmdDistance`]      | `[0, ∞)` | Sinkhorn-Knopp above dim 2 |

mod cosine;
mod emd;
mod kl;
mod l2;

pub use cosine::CosineDistance;
pub use emd::EmdDistance;
pub use kl::KlDivergence;
pub use l2::L2Distance;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Probability floor used when normalizing vectors to distributions.
pub const PROBABILITY_FLOOR: f64 = 1e-10;

/// Strategy converting two equal-length vectors into a scalar divergence.
pub trait DistanceMetric: Send + Sync {
    /// Compute the divergence between an expected and an actual vector.
    fn distance(&self, expected: &[f32], actual: &[f32]) -> CoreResult<f32>;

    /// Short stable name of the metric.
    fn name(&self) -> &'static str;

    /// Check whether a computed value lies in this metric's valid range.
    fn is_valid_distance(&self, d: f32) -> bool;
}

impl std::fmt::Debug for dyn DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceMetric")
            .field("name", &self.name())
            .finish()
    }
}

/// Discriminant for the built-in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Euclidean distance.
    L2,
    /// Cosine distance (1 − similarity).
    Cosine,
    /// Kullback-Leibler divergence.
    KlDivergence,
    /// Earth-mover's distance (Sinkhorn approximation).
    Emd,
}

/// Explicit metric registry, constructed once at startup.
///
/// Replaces any singleton factory: callers hold a reference and resolve
/// kinds to shared metric instances; there is no hidden global state.
pub struct MetricRegistry {
    metrics: HashMap<MetricKind, Arc<dyn DistanceMetric>>,
}

impl MetricRegistry {
    /// Build a registry containing the four built-in metrics.
    pub fn with_builtins() -> Self {
        let mut metrics: HashMap<MetricKind, Arc<dyn DistanceMetric>> = HashMap::new();
        metrics.insert(MetricKind::L2, Arc::new(L2Distance));
        metrics.insert(MetricKind::Cosine, Arc::new(CosineDistance));
        metrics.insert(MetricKind::KlDivergence, Arc::new(KlDivergence));
        metrics.insert(MetricKind::Emd, Arc::new(EmdDistance::default()));
        Self { metrics }
    }

    /// Build an empty registry; callers register their own metrics.
    pub fn empty() -> Self {
        Self {
            metrics: HashMap::new(),
        }
    }

    /// Resolve a kind to its metric instance.
    pub fn resolve(&self, kind: MetricKind) -> CoreResult<Arc<dyn DistanceMetric>> {
        self.metrics
            .get(&kind)
            .cloned()
            .ok_or(CoreError::UnknownMetric { kind })
    }

    /// Register or replace a metric (e.g. a test double).
    pub fn register(&mut self, kind: MetricKind, metric: Arc<dyn DistanceMetric>) {
        self.metrics.insert(kind, metric);
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("kinds", &self.metrics.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Validate a single vector: non-empty, all elements finite.
fn validate_vector(v: &[f32]) -> CoreResult<()> {
    if v.is_empty() {
        return Err(CoreError::EmptyVector);
    }
    for (index, &value) in v.iter().enumerate() {
        if !value.is_finite() {
            return Err(CoreError::NonFiniteElement { index, value });
        }
    }
    Ok(())
}

/// Shared validation for a metric input pair.
pub(crate) fn validate_pair(expected: &[f32], actual: &[f32]) -> CoreResult<()> {
    validate_vector(expected)?;
    validate_vector(actual)?;
    if expected.len() != actual.len() {
        return Err(CoreError::DimensionMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    Ok(())
}

/// Normalize a vector to a probability distribution.
///
/// Negatives are clamped to 0 and the result renormalized to sum 1.
/// A degenerate (zero-sum) input becomes the uniform distribution.
/// Every probability is floored at [`PROBABILITY_FLOOR`] so downstream
/// logarithms and divisions stay defined.
pub(crate) fn normalize_to_distribution(v: &[f32]) -> Vec<f64> {
    let clamped: Vec<f64> = v.iter().map(|&x| (x as f64).max(0.0)).collect();
    let sum: f64 = clamped.iter().sum();

    let mut dist: Vec<f64> = if sum <= 0.0 {
        let uniform = 1.0 / clamped.len() as f64;
        vec![uniform; clamped.len()]
    } else {
        clamped.iter().map(|&x| x / sum).collect()
    };

    for p in dist.iter_mut() {
        if *p < PROBABILITY_FLOOR {
            *p = PROBABILITY_FLOOR;
        }
    }
    dist
}
