//! Admission control under load.
//!
//! On each monitoring pass the control reads the queue length. Above the
//! threshold it becomes active and classifies the queued events:
//!
//! - priority < `drop_below` ⇒ removed and counted, never delivered
//! - `drop_below` ≤ priority < `degrade_below` ⇒ retained but passed to the
//!   degrade action (default: flagged for reduced-fidelity processing)
//! - priority ≥ `degrade_below` ⇒ untouched
//!
//! The resulting pressure state is published on a `watch` channel so
//! producers can throttle generation. Drops and degrades are observable
//! outcomes of normal operation, not errors.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::event::UpdateEvent;
use crate::queue::EventQueue;

/// Default queue length above which backpressure activates.
pub const DEFAULT_BACKPRESSURE_THRESHOLD: usize = 80;

/// Default cut-off below which events are dropped.
pub const DEFAULT_DROP_BELOW: f32 = 0.3;

/// Default cut-off below which events are degraded.
pub const DEFAULT_DEGRADE_BELOW: f32 = 0.6;

/// Pluggable transformation applied to events kept under pressure.
///
/// What "degrade" concretely means (reduced precision, merged payloads,
/// a flag for the consumer) is a product decision; the default
/// [`MarkDegraded`] only sets the event's flag.
pub trait DegradeAction: Send + Sync {
    /// Transform one retained event.
    fn degrade(&self, event: &mut UpdateEvent);
}

/// Default degrade action: set the `degraded` flag, leave the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkDegraded;

impl DegradeAction for MarkDegraded {
    fn degrade(&self, event: &mut UpdateEvent) {
        event.degraded = true;
    }
}

/// Pressure state published to producers. A signal to throttle, not a
/// hard stop.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PressureSignal {
    /// Whether backpressure is currently active.
    pub active: bool,
    /// Queue length at the last monitoring pass.
    pub queue_len: usize,
    /// Total events dropped so far.
    pub dropped_total: u64,
    /// Total events degraded so far.
    pub degraded_total: u64,
}

/// Result of one monitoring pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackpressureReport {
    /// Whether the pass found the queue above threshold.
    pub active: bool,
    /// Events dropped in this pass.
    pub dropped: usize,
    /// Events degraded in this pass.
    pub degraded: usize,
    /// Queue length after the pass.
    pub queue_len: usize,
}

/// Backpressure controller over one event queue.
pub struct BackpressureControl {
    threshold: usize,
    drop_below: f32,
    degrade_below: f32,
    degrade_action: Box<dyn DegradeAction>,
    dropped_total: u64,
    degraded_total: u64,
    pressure_tx: watch::Sender<PressureSignal>,
}

impl BackpressureControl {
    /// Create a control with the default thresholds and degrade action.
    pub fn new() -> Self {
        Self::with_thresholds(
            DEFAULT_BACKPRESSURE_THRESHOLD,
            DEFAULT_DROP_BELOW,
            DEFAULT_DEGRADE_BELOW,
        )
    }

    /// Create a control with custom thresholds.
    pub fn with_thresholds(threshold: usize, drop_below: f32, degrade_below: f32) -> Self {
        let (pressure_tx, _) = watch::channel(PressureSignal::default());
        Self {
            threshold,
            drop_below,
            degrade_below: degrade_below.max(drop_below),
            degrade_action: Box::new(MarkDegraded),
            dropped_total: 0,
            degraded_total: 0,
            pressure_tx,
        }
    }

    /// Replace the degrade transformation.
    pub fn set_degrade_action(&mut self, action: Box<dyn DegradeAction>) {
        self.degrade_action = action;
    }

    /// Subscribe to the pressure signal.
    pub fn subscribe(&self) -> watch::Receiver<PressureSignal> {
        self.pressure_tx.subscribe()
    }

    /// Whether the given queue length would activate backpressure.
    /// The boundary is exclusive: length equal to the threshold does not.
    pub fn should_apply(&self, queue_len: usize) -> bool {
        queue_len > self.threshold
    }

    /// Run one monitoring pass over the queue.
    pub fn monitor(&mut self, queue: &mut EventQueue) -> BackpressureReport {
        let len = queue.len();

        let report = if self.should_apply(len) {
            let drop_below = self.drop_below;
            let dropped = queue.drop_where(|e| e.priority < drop_below);

            let degrade_below = self.degrade_below;
            let action = &self.degrade_action;
            let degraded = queue.modify_where(
                |e| e.priority >= drop_below && e.priority < degrade_below && !e.degraded,
                |e| action.degrade(e),
            );

            self.dropped_total += dropped as u64;
            self.degraded_total += degraded as u64;

            warn!(
                queue_len = len,
                dropped, degraded, "backpressure active, shed low-priority work"
            );

            BackpressureReport {
                active: true,
                dropped,
                degraded,
                queue_len: queue.len(),
            }
        } else {
            debug!(queue_len = len, threshold = self.threshold, "queue within capacity");
            BackpressureReport {
                active: false,
                dropped: 0,
                degraded: 0,
                queue_len: len,
            }
        };

        // Notify producers; receivers may have gone away, which is fine.
        let _ = self.pressure_tx.send(PressureSignal {
            active: report.active,
            queue_len: report.queue_len,
            dropped_total: self.dropped_total,
            degraded_total: self.degraded_total,
        });

        report
    }

    /// Total events dropped since construction.
    pub fn dropped_total(&self) -> u64 {
        self.dropped_total
    }

    /// Total events degraded since construction.
    pub fn degraded_total(&self) -> u64 {
        self.degraded_total
    }
}

impl Default for BackpressureControl {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackpressureControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackpressureControl")
            .field("threshold", &self.threshold)
            .field("drop_below", &self.drop_below)
            .field("degrade_below", &self.degrade_below)
            .field("dropped_total", &self.dropped_total)
            .field("degraded_total", &self.degraded_total)
            .finish()
    }
}
