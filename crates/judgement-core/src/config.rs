//! Core configuration surface.
//!
//! All tunables are constructor parameters, not files: callers build a
//! [`CoreConfig`] (or deserialize one) and hand the values to the
//! components they construct. `Default` carries the documented defaults.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::link::DEFAULT_HISTORY_CAPACITY;
use crate::metrics::MetricKind;
use crate::policy::{DEFAULT_BASE_RATE, DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD, DEFAULT_MAX_RATE};
use crate::sensitivity::{DEFAULT_AMPLIFICATION, DEFAULT_HALF_LIFE};

/// Configuration for the judgement core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Distance metric to use for new links.
    pub metric: MetricKind,
    /// Full-skip threshold.
    pub skip_low: f32,
    /// Focused-calculation threshold.
    pub skip_high: f32,
    /// Base learning rate for the proportional policy.
    pub base_rate: f32,
    /// Learning-rate ceiling.
    pub max_rate: f32,
    /// Per-link history capacity.
    pub history_capacity: usize,
    /// Initial amplification of published bursts.
    pub burst_amplification: f32,
    /// Burst half-life in milliseconds.
    pub burst_half_life_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            metric: MetricKind::Cosine,
            skip_low: DEFAULT_LOW_THRESHOLD,
            skip_high: DEFAULT_HIGH_THRESHOLD,
            base_rate: DEFAULT_BASE_RATE,
            max_rate: DEFAULT_MAX_RATE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            burst_amplification: DEFAULT_AMPLIFICATION,
            burst_half_life_ms: DEFAULT_HALF_LIFE.as_millis() as u64,
        }
    }
}

impl CoreConfig {
    /// Validate cross-field constraints.
    pub fn validate(&self) -> CoreResult<()> {
        if self.skip_low < 0.0 || self.skip_low >= self.skip_high {
            return Err(CoreError::InvalidThresholds {
                low: self.skip_low,
                high: self.skip_high,
            });
        }
        if self.base_rate <= 0.0 || self.base_rate > self.max_rate {
            return Err(CoreError::InvalidRateBounds {
                base: self.base_rate,
                max: self.max_rate,
            });
        }
        if self.burst_amplification < 1.0 {
            return Err(CoreError::InvalidAmplification {
                value: self.burst_amplification,
            });
        }
        if self.burst_half_life_ms == 0 {
            return Err(CoreError::InvalidHalfLife { millis: 0 });
        }
        if self.history_capacity == 0 {
            return Err(CoreError::InvalidConfig {
                message: "history_capacity must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
