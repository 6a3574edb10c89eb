//! Euclidean (L2) distance.

use super::{validate_pair, DistanceMetric};
use crate::error::CoreResult;

/// Euclidean distance: `sqrt(Σ(eᵢ−aᵢ)²)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Distance;

impl DistanceMetric for L2Distance {
    fn distance(&self, expected: &[f32], actual: &[f32]) -> CoreResult<f32> {
        validate_pair(expected, actual)?;

        let sum_sq: f64 = expected
            .iter()
            .zip(actual.iter())
            .map(|(&e, &a)| {
                let d = (e - a) as f64;
                d * d
            })
            .sum();

        Ok(sum_sq.sqrt() as f32)
    }

    fn name(&self) -> &'static str {
        "l2"
    }

    fn is_valid_distance(&self, d: f32) -> bool {
        d.is_finite() && d >= 0.0
    }
}
