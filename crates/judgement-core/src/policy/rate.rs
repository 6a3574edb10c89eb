//! Learning-rate policies.

use serde::{Deserialize, Serialize};

use super::{AdaptiveLearningRate, LearningRatePolicy, RateOrigin};
use crate::difference::RelativeDifference;
use crate::error::{CoreError, CoreResult};

/// Default base learning rate.
pub const DEFAULT_BASE_RATE: f32 = 0.01;

/// Default learning-rate ceiling.
pub const DEFAULT_MAX_RATE: f32 = 0.5;

/// Rate grows with divergence: `min(base·(1 + magnitude), max)`.
///
/// Larger divergences get proportionally larger rates so the downstream
/// model corrects faster where its prediction was most wrong, while the
/// ceiling keeps a pathological divergence from destabilizing it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProportionalRatePolicy {
    base_rate: f32,
    max_rate: f32,
}

impl ProportionalRatePolicy {
    /// Create a policy, failing fast unless `0 < base <= max`.
    pub fn new(base_rate: f32, max_rate: f32) -> CoreResult<Self> {
        if !(base_rate.is_finite() && max_rate.is_finite())
            || base_rate <= 0.0
            || base_rate > max_rate
        {
            return Err(CoreError::InvalidRateBounds {
                base: base_rate,
                max: max_rate,
            });
        }
        Ok(Self {
            base_rate,
            max_rate,
        })
    }

    /// Base learning rate.
    pub fn base_rate(&self) -> f32 {
        self.base_rate
    }

    /// Learning-rate ceiling.
    pub fn max_rate(&self) -> f32 {
        self.max_rate
    }
}

impl Default for ProportionalRatePolicy {
    fn default() -> Self {
        Self {
            base_rate: DEFAULT_BASE_RATE,
            max_rate: DEFAULT_MAX_RATE,
        }
    }
}

impl LearningRatePolicy for ProportionalRatePolicy {
    fn adjust(&self, difference: &RelativeDifference) -> CoreResult<AdaptiveLearningRate> {
        let raw = self.base_rate * (1.0 + difference.magnitude());
        Ok(AdaptiveLearningRate::new(
            raw.min(self.max_rate),
            RateOrigin::Adaptive,
        ))
    }
}

/// Constant rate, independent of the divergence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedRatePolicy {
    rate: f32,
}

impl FixedRatePolicy {
    /// Create a fixed-rate policy; negatives are clamped to 0.
    pub fn new(rate: f32) -> Self {
        Self {
            rate: rate.max(0.0),
        }
    }
}

impl LearningRatePolicy for FixedRatePolicy {
    fn adjust(&self, _difference: &RelativeDifference) -> CoreResult<AdaptiveLearningRate> {
        Ok(AdaptiveLearningRate::new(self.rate, RateOrigin::Manual))
    }
}
