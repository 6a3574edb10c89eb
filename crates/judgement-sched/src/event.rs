//! Pending update work.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use judgement_core::layer::LayerId;
use judgement_core::signal::LearningSignal;

/// Priority at or above which an event takes the immediate path.
pub const DEFAULT_IMMEDIATE_THRESHOLD: f32 = 0.9;

/// Which dispatch path an event travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrgencyClass {
    /// Interrupt-style synchronous dispatch.
    Immediate,
    /// Batched dispatch on the periodic frame tick.
    Frame,
}

/// One unit of pending update work.
///
/// Priority is clamped into `[0, 1]` at construction and stable once the
/// event is enqueued. The `degraded` flag is the default backpressure
/// degrade marker: the payload survives but is flagged for
/// reduced-fidelity processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// Unique event id.
    pub id: Uuid,
    /// Dispatch priority in `[0, 1]`.
    pub priority: f32,
    /// Clock time at creation, in milliseconds.
    pub created_at_ms: u64,
    /// Layer that should apply the signal.
    pub target: LayerId,
    /// The learning signal to deliver.
    pub signal: LearningSignal,
    /// Set by backpressure when the event was kept but degraded.
    pub degraded: bool,
}

impl UpdateEvent {
    /// Create an event, clamping priority into `[0, 1]`.
    pub fn new(priority: f32, target: LayerId, signal: LearningSignal, created_at_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            priority: if priority.is_finite() {
                priority.clamp(0.0, 1.0)
            } else {
                0.0
            },
            created_at_ms,
            target,
            signal,
            degraded: false,
        }
    }

    /// Classify the event against an immediate-path threshold.
    pub fn urgency(&self, immediate_threshold: f32) -> UrgencyClass {
        if self.priority >= immediate_threshold {
            UrgencyClass::Immediate
        } else {
            UrgencyClass::Frame
        }
    }
}
