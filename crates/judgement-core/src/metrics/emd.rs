//! Earth-mover's distance (approximate Wasserstein-1).
//!
//! Both inputs are normalized to probability distributions over their bin
//! indices. For dimension ≤ 2 the exact closed form `Σ|cumP − cumQ|` is
//! used; above that the distance is approximated with Sinkhorn-Knopp
//! iteration over an entropically regularized transport plan.

use super::{normalize_to_distribution, validate_pair, DistanceMetric};
use crate::error::CoreResult;

/// Entropic regularization strength for the Gibbs kernel.
const SINKHORN_LAMBDA: f64 = 10.0;

/// Maximum Sinkhorn scaling iterations.
const SINKHORN_MAX_ITERATIONS: usize = 1000;

/// Convergence threshold on the scaling vectors.
const SINKHORN_TOLERANCE: f64 = 1e-8;

/// Division guard for degenerate kernel sums.
const DIVISION_GUARD: f64 = 1e-15;

/// Approximate earth-mover's distance between two distributions.
#[derive(Debug, Clone, Copy)]
pub struct EmdDistance {
    max_iterations: usize,
    tolerance: f64,
}

impl Default for EmdDistance {
    fn default() -> Self {
        Self {
            max_iterations: SINKHORN_MAX_ITERATIONS,
            tolerance: SINKHORN_TOLERANCE,
        }
    }
}

impl EmdDistance {
    /// Create a solver with custom iteration limits.
    pub fn with_limits(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            tolerance: tolerance.abs(),
        }
    }

    /// Exact 1-D EMD as the sum of absolute CDF differences.
    fn closed_form(p: &[f64], q: &[f64]) -> f64 {
        let mut cum_p = 0.0;
        let mut cum_q = 0.0;
        let mut total = 0.0;
        for (pi, qi) in p.iter().zip(q.iter()) {
            cum_p += pi;
            cum_q += qi;
            total += (cum_p - cum_q).abs();
        }
        total
    }

    /// Sinkhorn-Knopp approximation of the optimal transport cost.
    fn sinkhorn(&self, p: &[f64], q: &[f64]) -> f64 {
        let n = p.len();

        // Cost matrix C[i][j] = |i - j| and Gibbs kernel K = exp(-λC),
        // both functions of |i - j| only, so one row suffices.
        let kernel_band: Vec<f64> = (0..n)
            .map(|d| (-SINKHORN_LAMBDA * d as f64).exp())
            .collect();
        let kernel = |i: usize, j: usize| kernel_band[i.abs_diff(j)];

        let mut u = vec![1.0f64; n];
        let mut v = vec![1.0f64; n];

        for _ in 0..self.max_iterations {
            let mut max_change: f64 = 0.0;

            for i in 0..n {
                let kv: f64 = (0..n).map(|j| kernel(i, j) * v[j]).sum();
                let next = p[i] / kv.max(DIVISION_GUARD);
                max_change = max_change.max((next - u[i]).abs());
                u[i] = next;
            }
            for j in 0..n {
                let ku: f64 = (0..n).map(|i| kernel(i, j) * u[i]).sum();
                let next = q[j] / ku.max(DIVISION_GUARD);
                max_change = max_change.max((next - v[j]).abs());
                v[j] = next;
            }

            if max_change < self.tolerance {
                break;
            }
        }

        let mut cost = 0.0;
        for i in 0..n {
            for j in 0..n {
                cost += u[i] * kernel(i, j) * v[j] * i.abs_diff(j) as f64;
            }
        }
        cost
    }
}

impl DistanceMetric for EmdDistance {
    fn distance(&self, expected: &[f32], actual: &[f32]) -> CoreResult<f32> {
        validate_pair(expected, actual)?;

        let p = normalize_to_distribution(expected);
        let q = normalize_to_distribution(actual);

        let cost = if p.len() <= 2 {
            Self::closed_form(&p, &q)
        } else {
            self.sinkhorn(&p, &q)
        };

        Ok(cost.max(0.0) as f32)
    }

    fn name(&self) -> &'static str {
        "emd"
    }

    fn is_valid_distance(&self, d: f32) -> bool {
        d.is_finite() && d >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emd_identity_is_zero() {
        let metric = EmdDistance::default();
        let v = vec![0.5, 0.5];
        let d = metric.distance(&v, &v).unwrap();
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn test_emd_closed_form_known_value() {
        let metric = EmdDistance::default();
        // All mass moves one bin: |1-0| summed over the first bin's CDF gap
        let d = metric.distance(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_emd_matches_cdf_difference_above_dim_two() {
        let metric = EmdDistance::default();
        // Exact EMD for [1,0,0] -> [0,0,1] is 2 (mass travels 2 bins)
        let d = metric.distance(&[1.0, 0.0, 0.0], &[0.0, 0.0, 1.0]).unwrap();
        assert!(d >= 0.0);
        assert!((d - 2.0).abs() < 0.2, "sinkhorn approximation too far: {d}");
    }

    #[test]
    fn test_emd_is_non_negative() {
        let metric = EmdDistance::default();
        let d = metric
            .distance(&[0.1, 0.4, 0.3, 0.2], &[0.3, 0.1, 0.2, 0.4])
            .unwrap();
        assert!(d >= 0.0);
    }

    #[test]
    fn test_emd_nearby_distributions_are_close() {
        let metric = EmdDistance::default();
        let d_near = metric
            .distance(&[0.5, 0.3, 0.2, 0.0], &[0.4, 0.4, 0.2, 0.0])
            .unwrap();
        let d_far = metric
            .distance(&[1.0, 0.0, 0.0, 0.0], &[0.0, 0.0, 0.0, 1.0])
            .unwrap();
        assert!(d_near < d_far);
    }

    #[test]
    fn test_emd_zero_sum_falls_back_to_uniform() {
        let metric = EmdDistance::default();
        let d = metric.distance(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0]).unwrap();
        assert!(d.abs() < 1e-3);
    }

    #[test]
    fn test_emd_custom_limits_still_converge() {
        let metric = EmdDistance::with_limits(50, 1e-6);
        let d = metric
            .distance(&[0.7, 0.2, 0.1], &[0.1, 0.2, 0.7])
            .unwrap();
        assert!(d.is_finite());
        assert!(d > 0.0);
    }
}
