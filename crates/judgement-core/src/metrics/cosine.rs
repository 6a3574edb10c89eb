//! Cosine distance.

use super::{validate_pair, DistanceMetric};
use crate::error::CoreResult;

/// Norm below which a vector is treated as zero.
const ZERO_NORM: f64 = 1e-12;

/// Cosine distance: `1 − cos_sim(e, a)`, range `[0, 2]`.
///
/// Zero-vector handling is an expected data condition, not an error:
/// both vectors zero ⇒ similarity 1 (distance 0); exactly one zero ⇒
/// similarity 0 (distance 1).
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineDistance;

impl DistanceMetric for CosineDistance {
    fn distance(&self, expected: &[f32], actual: &[f32]) -> CoreResult<f32> {
        validate_pair(expected, actual)?;

        let norm_e = norm(expected);
        let norm_a = norm(actual);

        let similarity = match (norm_e < ZERO_NORM, norm_a < ZERO_NORM) {
            (true, true) => 1.0,
            (true, false) | (false, true) => 0.0,
            (false, false) => {
                let dot: f64 = expected
                    .iter()
                    .zip(actual.iter())
                    .map(|(&e, &a)| e as f64 * a as f64)
                    .sum();
                (dot / (norm_e * norm_a)).clamp(-1.0, 1.0)
            }
        };

        Ok((1.0 - similarity) as f32)
    }

    fn name(&self) -> &'static str {
        "cosine"
    }

    fn is_valid_distance(&self, d: f32) -> bool {
        d.is_finite() && (0.0..=2.0).contains(&d)
    }
}

fn norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_parallel_is_zero() {
        let metric = CosineDistance;
        let d = metric.distance(&[1.0, 2.0], &[2.0, 4.0]).unwrap();
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_is_one() {
        let metric = CosineDistance;
        let d = metric.distance(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap();
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite_is_two() {
        let metric = CosineDistance;
        let d = metric.distance(&[1.0, 1.0], &[-1.0, -1.0]).unwrap();
        assert!((d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_both_zero_vectors() {
        let metric = CosineDistance;
        let d = metric.distance(&[0.0, 0.0], &[0.0, 0.0]).unwrap();
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_one_zero_vector() {
        let metric = CosineDistance;
        let d = metric.distance(&[0.0, 0.0], &[1.0, 2.0]).unwrap();
        assert!((d - 1.0).abs() < 1e-6);

        let d = metric.distance(&[1.0, 2.0], &[0.0, 0.0]).unwrap();
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_range_bounds() {
        let metric = CosineDistance;
        assert!(metric.is_valid_distance(0.0));
        assert!(metric.is_valid_distance(2.0));
        assert!(!metric.is_valid_distance(2.1));
        assert!(!metric.is_valid_distance(-0.01));
    }
}
