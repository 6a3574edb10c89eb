//! Kullback-Leibler divergence.

use super::{normalize_to_distribution, validate_pair, DistanceMetric};
use crate::error::CoreResult;

/// KL divergence `KL(P‖Q) = Σ Pᵢ·ln(Pᵢ/Qᵢ)`, range `[0, ∞)`.
///
/// Both inputs are normalized to probability distributions first
/// (negatives clamped, zero-sum ⇒ uniform, probabilities floored).
///
/// Deliberately asymmetric: the expected pattern is P, the actual
/// pattern is Q, so the value reads as "how surprised the model's
/// expectation is by what was observed".
#[derive(Debug, Clone, Copy, Default)]
pub struct KlDivergence;

impl DistanceMetric for KlDivergence {
    fn distance(&self, expected: &[f32], actual: &[f32]) -> CoreResult<f32> {
        validate_pair(expected, actual)?;

        let p = normalize_to_distribution(expected);
        let q = normalize_to_distribution(actual);

        let kl: f64 = p
            .iter()
            .zip(q.iter())
            .map(|(&pi, &qi)| pi * (pi / qi).ln())
            .sum();

        // Floating-point noise can push KL(P,P) a hair below zero.
        Ok(kl.max(0.0) as f32)
    }

    fn name(&self) -> &'static str {
        "kl_divergence"
    }

    fn is_valid_distance(&self, d: f32) -> bool {
        d.is_finite() && d >= 0.0
    }
}
