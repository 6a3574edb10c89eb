//! Scheduler configuration surface.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backpressure::{
    DEFAULT_BACKPRESSURE_THRESHOLD, DEFAULT_DEGRADE_BELOW, DEFAULT_DROP_BELOW,
};
use crate::error::{SchedError, SchedResult};
use crate::event::DEFAULT_IMMEDIATE_THRESHOLD;
use crate::queue::DEFAULT_QUEUE_CAPACITY;

/// Default base tick of the control frame timer.
pub const DEFAULT_BASE_TICK: Duration = Duration::from_millis(16);

/// Default number of frame events drained per tick.
pub const DEFAULT_FRAME_BATCH: usize = 10;

/// Configuration for the update scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedConfig {
    /// Bounded queue capacity.
    pub queue_capacity: usize,
    /// Queue length above which backpressure activates (exclusive).
    pub backpressure_threshold: usize,
    /// Priority below which backpressure drops events.
    pub drop_below: f32,
    /// Priority below which backpressure degrades events.
    pub degrade_below: f32,
    /// Base tick period of the frame timer.
    pub base_tick: Duration,
    /// Maximum frame events dispatched per tick.
    pub frame_batch: usize,
    /// Priority at or above which events take the immediate path.
    pub immediate_threshold: f32,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            backpressure_threshold: DEFAULT_BACKPRESSURE_THRESHOLD,
            drop_below: DEFAULT_DROP_BELOW,
            degrade_below: DEFAULT_DEGRADE_BELOW,
            base_tick: DEFAULT_BASE_TICK,
            frame_batch: DEFAULT_FRAME_BATCH,
            immediate_threshold: DEFAULT_IMMEDIATE_THRESHOLD,
        }
    }
}

impl SchedConfig {
    /// Validate cross-field constraints.
    pub fn validate(&self) -> SchedResult<()> {
        if self.queue_capacity == 0 {
            return Err(SchedError::InvalidConfig {
                message: "queue_capacity must be > 0".to_string(),
            });
        }
        if self.base_tick.is_zero() {
            return Err(SchedError::InvalidConfig {
                message: "base_tick must be > 0".to_string(),
            });
        }
        if self.frame_batch == 0 {
            return Err(SchedError::InvalidConfig {
                message: "frame_batch must be > 0".to_string(),
            });
        }
        if self.drop_below > self.degrade_below {
            return Err(SchedError::InvalidConfig {
                message: format!(
                    "drop_below {} exceeds degrade_below {}",
                    self.drop_below, self.degrade_below
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.immediate_threshold) {
            return Err(SchedError::InvalidConfig {
                message: format!(
                    "immediate_threshold {} outside [0, 1]",
                    self.immediate_threshold
                ),
            });
        }
        Ok(())
    }
}
