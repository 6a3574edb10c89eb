//! Threshold-based skip strategy.

use serde::{Deserialize, Serialize};

use super::{SkipDecision, SkipPolicy};
use crate::difference::RelativeDifference;
use crate::error::{CoreError, CoreResult};

/// Default lower (full-skip) threshold.
pub const DEFAULT_LOW_THRESHOLD: f32 = 0.01;

/// Default upper (focused-calculation) threshold.
pub const DEFAULT_HIGH_THRESHOLD: f32 = 0.5;

/// Two-threshold skip classifier.
///
/// - magnitude < `low`  ⇒ [`SkipDecision::FullSkip`]
/// - magnitude < `high` ⇒ [`SkipDecision::PartialUpdate`]
/// - otherwise          ⇒ [`SkipDecision::FocusedCalculation`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleSkipStrategy {
    low: f32,
    high: f32,
}

impl SimpleSkipStrategy {
    /// Create a strategy, failing fast unless `0 <= low < high`.
    pub fn new(low: f32, high: f32) -> CoreResult<Self> {
        if !(low.is_finite() && high.is_finite()) || low < 0.0 || low >= high {
            return Err(CoreError::InvalidThresholds { low, high });
        }
        Ok(Self { low, high })
    }

    /// Lower threshold.
    pub fn low(&self) -> f32 {
        self.low
    }

    /// Upper threshold.
    pub fn high(&self) -> f32 {
        self.high
    }
}

impl Default for SimpleSkipStrategy {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl SkipPolicy for SimpleSkipStrategy {
    fn judge(&self, difference: &RelativeDifference) -> SkipDecision {
        let magnitude = difference.magnitude();
        if magnitude < self.low {
            SkipDecision::FullSkip
        } else if magnitude < self.high {
            SkipDecision::PartialUpdate
        } else {
            SkipDecision::FocusedCalculation
        }
    }
}
