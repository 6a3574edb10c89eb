//! Time-decaying learning-rate bursts.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default initial amplification factor.
pub const DEFAULT_AMPLIFICATION: f32 = 2.0;

/// Default half-life (30 seconds).
pub const DEFAULT_HALF_LIFE: Duration = Duration::from_secs(30);

/// Amplification above which a burst counts as active.
pub const ACTIVE_AMPLIFICATION_FLOOR: f32 = 1.1;

/// A temporary amplification of learning-rate sensitivity for a tag set.
///
/// The amplification decays exponentially toward 1:
///
/// `amplification(t) = 1 + (A₀ − 1) · exp(−ln2 · Δt / half_life)`
///
/// Bursts expire implicitly through decay; there is no explicit destroy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LrBurst {
    /// Tags whose learning rate this burst amplifies.
    pub tags: HashSet<String>,
    /// Amplification at creation time, ≥ 1.
    pub initial_amplification: f32,
    /// Half-life of the decay, > 0.
    pub half_life: Duration,
    /// Clock time at creation, in milliseconds.
    pub created_at_ms: u64,
}

impl LrBurst {
    /// Create a burst, validating amplification ≥ 1 and half-life > 0.
    pub fn new<I, S>(
        tags: I,
        initial_amplification: f32,
        half_life: Duration,
        created_at_ms: u64,
    ) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !initial_amplification.is_finite() || initial_amplification < 1.0 {
            return Err(CoreError::InvalidAmplification {
                value: initial_amplification,
            });
        }
        if half_life.is_zero() {
            return Err(CoreError::InvalidHalfLife {
                millis: half_life.as_millis() as u64,
            });
        }
        Ok(Self {
            tags: tags.into_iter().map(Into::into).collect(),
            initial_amplification,
            half_life,
            created_at_ms,
        })
    }

    /// Create a burst with the default amplification and half-life.
    pub fn with_defaults<I, S>(tags: I, created_at_ms: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            initial_amplification: DEFAULT_AMPLIFICATION,
            half_life: DEFAULT_HALF_LIFE,
            created_at_ms,
        }
    }

    /// Amplification at the given clock time, decayed toward 1.
    pub fn current_amplification(&self, now_ms: u64) -> f32 {
        let elapsed_ms = now_ms.saturating_sub(self.created_at_ms) as f64;
        let half_life_ms = self.half_life.as_millis() as f64;
        let decay = (-std::f64::consts::LN_2 * elapsed_ms / half_life_ms).exp();
        (1.0 + (self.initial_amplification as f64 - 1.0) * decay) as f32
    }

    /// Whether the burst still amplifies meaningfully (> 1.1).
    pub fn is_active(&self, now_ms: u64) -> bool {
        self.current_amplification(now_ms) > ACTIVE_AMPLIFICATION_FLOOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst() -> LrBurst {
        LrBurst::new(["novel"], 2.0, Duration::from_millis(30_000), 0).unwrap()
    }

    #[test]
    fn test_burst_amplification_at_creation() {
        let b = burst();
        assert!((b.current_amplification(0) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_burst_one_half_life() {
        let b = burst();
        assert!((b.current_amplification(30_000) - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_burst_decays_toward_one() {
        let b = burst();
        let far = b.current_amplification(30_000 * 20);
        assert!((far - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_burst_is_monotonically_decaying() {
        let b = burst();
        let mut prev = b.current_amplification(0);
        for t in (1..10).map(|i| i * 10_000) {
            let cur = b.current_amplification(t);
            assert!(cur < prev);
            prev = cur;
        }
    }

    #[test]
    fn test_burst_active_threshold() {
        let b = burst();
        assert!(b.is_active(0));
        assert!(b.is_active(30_000));
        // amplification(t) = 1.1 when exp term = 0.1, i.e. after ~3.32 half-lives
        assert!(!b.is_active(120_000));
    }

    #[test]
    fn test_burst_rejects_amplification_below_one() {
        let err = LrBurst::new(["x"], 0.9, Duration::from_secs(1), 0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmplification { .. }));
    }

    #[test]
    fn test_burst_rejects_zero_half_life() {
        let err = LrBurst::new(["x"], 2.0, Duration::ZERO, 0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidHalfLife { .. }));
    }

    #[test]
    fn test_burst_clock_before_creation_saturates() {
        let b = LrBurst::new(["x"], 2.0, Duration::from_secs(30), 1000).unwrap();
        assert!((b.current_amplification(500) - 2.0).abs() < 1e-5);
    }
}
