//! Per-layer update rhythms and phase synchronization.
//!
//! Each layer runs at its own cycle length while sharing one base timer.
//! The phase offset staggers layers within the shared timer so their
//! ticks do not pile onto the same base tick - a load-smoothing design,
//! not an arbitrary choice. For a layer with cycle `c` and phase `p`, the
//! tick index at elapsed time `t` is `floor((t - c·p) / c)`; the layer
//! fires exactly when that index increases between two base ticks.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

use judgement_core::layer::LayerId;

use crate::error::{SchedError, SchedResult};

/// Schedule of one layer: cycle length, phase offset, on/off switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRhythmConfig {
    /// Cycle length; at least one millisecond.
    pub cycle: Duration,
    /// Phase offset as a fraction of the cycle, in `[0, 1)`.
    pub phase: f32,
    /// Whether the layer participates in scheduling.
    pub enabled: bool,
}

impl LayerRhythmConfig {
    /// Create a config, validating cycle ≥ 1ms and phase ∈ [0, 1).
    ///
    /// Tick indices are tracked in whole milliseconds, so a cycle that
    /// truncates to 0ms is rejected here rather than dividing by zero
    /// later.
    pub fn new(cycle: Duration, phase: f32, enabled: bool) -> SchedResult<Self> {
        if cycle.as_millis() == 0 {
            return Err(SchedError::InvalidRhythm {
                message: format!("cycle {cycle:?} shorter than the 1ms tick resolution"),
            });
        }
        if !(0.0..1.0).contains(&phase) {
            return Err(SchedError::InvalidRhythm {
                message: format!("phase {phase} outside [0, 1)"),
            });
        }
        Ok(Self {
            cycle,
            phase,
            enabled,
        })
    }
}

/// Tracks per-layer tick indices against a shared clock origin.
#[derive(Debug)]
pub struct RhythmTracker {
    start_ms: u64,
    configs: HashMap<LayerId, LayerRhythmConfig>,
    last_index: HashMap<LayerId, i64>,
}

impl RhythmTracker {
    /// Create a tracker anchored at the given clock time.
    pub fn new(start_ms: u64) -> Self {
        Self {
            start_ms,
            configs: HashMap::new(),
            last_index: HashMap::new(),
        }
    }

    /// Register or replace a layer's rhythm.
    ///
    /// The layer's first fire is its first cycle boundary after the
    /// tracker origin (offset by its phase), not the next base tick.
    pub fn set_rhythm(&mut self, layer: LayerId, config: LayerRhythmConfig) {
        // configs built as struct literals can bypass new(); never divide by 0
        let cycle_ms = (config.cycle.as_millis() as i64).max(1);
        let offset_ms = (cycle_ms as f64 * config.phase as f64) as i64;
        let initial = (-offset_ms).div_euclid(cycle_ms);
        self.last_index.insert(layer.clone(), initial);
        self.configs.insert(layer, config);
    }

    /// Remove a layer's rhythm.
    pub fn remove_rhythm(&mut self, layer: &LayerId) {
        self.configs.remove(layer);
        self.last_index.remove(layer);
    }

    /// Enable or disable a layer without losing its config.
    pub fn set_enabled(&mut self, layer: &LayerId, enabled: bool) {
        if let Some(config) = self.configs.get_mut(layer) {
            config.enabled = enabled;
        }
    }

    /// Layers whose tick index increased since the previous base tick.
    ///
    /// Call once per base tick with the current clock time; each due
    /// layer is reported exactly once per cycle boundary crossed.
    pub fn due_layers(&mut self, now_ms: u64) -> Vec<LayerId> {
        let elapsed = now_ms.saturating_sub(self.start_ms) as i64;
        let mut due = Vec::new();

        for (layer, config) in &self.configs {
            if !config.enabled {
                continue;
            }

            let cycle_ms = (config.cycle.as_millis() as i64).max(1);
            let offset_ms = (cycle_ms as f64 * config.phase as f64) as i64;
            let index = (elapsed - offset_ms).div_euclid(cycle_ms);

            let last = self.last_index.get(layer).copied().unwrap_or(-1);
            if index > last && index >= 0 {
                trace!(layer = %layer, index, "layer rhythm due");
                due.push(layer.clone());
            }
            self.last_index.insert(layer.clone(), index.max(last));
        }

        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &str) -> LayerId {
        LayerId::new(name)
    }

    #[test]
    fn test_rhythm_config_validation() {
        assert!(LayerRhythmConfig::new(Duration::ZERO, 0.0, true).is_err());
        assert!(LayerRhythmConfig::new(Duration::from_millis(16), 1.0, true).is_err());
        assert!(LayerRhythmConfig::new(Duration::from_millis(16), -0.1, true).is_err());
        assert!(LayerRhythmConfig::new(Duration::from_millis(16), 0.99, true).is_ok());
    }

    #[test]
    fn test_sub_millisecond_cycle_rejected() {
        // 500µs is non-zero but truncates to 0 whole milliseconds
        assert!(LayerRhythmConfig::new(Duration::from_micros(500), 0.0, true).is_err());
        assert!(LayerRhythmConfig::new(Duration::from_millis(1), 0.0, true).is_ok());
    }

    #[test]
    fn test_unvalidated_sub_millisecond_cycle_does_not_panic() {
        // Fields are public, so a struct literal can skip new()
        let mut tracker = RhythmTracker::new(0);
        tracker.set_rhythm(
            layer("tiny"),
            LayerRhythmConfig {
                cycle: Duration::from_micros(500),
                phase: 0.0,
                enabled: true,
            },
        );
        tracker.due_layers(10);
    }

    #[test]
    fn test_layer_fires_once_per_cycle() {
        let mut tracker = RhythmTracker::new(0);
        tracker.set_rhythm(
            layer("sensory"),
            LayerRhythmConfig::new(Duration::from_millis(100), 0.0, true).unwrap(),
        );

        // Base ticks every 16ms over one second: exactly 10 cycle
        // boundaries are crossed
        let mut fired = 0;
        for tick in 1..=62 {
            fired += tracker.due_layers(tick * 16).len();
        }
        assert_eq!(fired, 9);
        fired += tracker.due_layers(1000).len();
        assert_eq!(fired, 10);
    }

    #[test]
    fn test_phase_offset_staggers_layers() {
        let mut tracker = RhythmTracker::new(0);
        // Same cycle, phases 0 and 0.5, cycle = 2 base ticks
        tracker.set_rhythm(
            layer("a"),
            LayerRhythmConfig::new(Duration::from_millis(32), 0.0, true).unwrap(),
        );
        tracker.set_rhythm(
            layer("b"),
            LayerRhythmConfig::new(Duration::from_millis(32), 0.5, true).unwrap(),
        );

        for tick in 1..=20 {
            let due = tracker.due_layers(tick * 16);
            assert!(
                due.len() <= 1,
                "phased layers fired on the same base tick: {due:?}"
            );
        }
    }

    #[test]
    fn test_disabled_layer_never_fires() {
        let mut tracker = RhythmTracker::new(0);
        tracker.set_rhythm(
            layer("off"),
            LayerRhythmConfig::new(Duration::from_millis(10), 0.0, false).unwrap(),
        );

        assert!(tracker.due_layers(100).is_empty());
    }

    #[test]
    fn test_reenabled_layer_resumes() {
        let mut tracker = RhythmTracker::new(0);
        tracker.set_rhythm(
            layer("x"),
            LayerRhythmConfig::new(Duration::from_millis(10), 0.0, true).unwrap(),
        );

        assert_eq!(tracker.due_layers(10).len(), 1);
        tracker.set_enabled(&layer("x"), false);
        assert!(tracker.due_layers(20).is_empty());
        tracker.set_enabled(&layer("x"), true);
        assert_eq!(tracker.due_layers(30).len(), 1);
    }

    #[test]
    fn test_independent_rates() {
        let mut tracker = RhythmTracker::new(0);
        // 60Hz-ish and 30Hz-ish layers
        tracker.set_rhythm(
            layer("fast"),
            LayerRhythmConfig::new(Duration::from_millis(16), 0.0, true).unwrap(),
        );
        tracker.set_rhythm(
            layer("slow"),
            LayerRhythmConfig::new(Duration::from_millis(32), 0.0, true).unwrap(),
        );

        let mut fast = 0;
        let mut slow = 0;
        for tick in 1..=64 {
            for l in tracker.due_layers(tick * 16) {
                if l == layer("fast") {
                    fast += 1;
                } else {
                    slow += 1;
                }
            }
        }
        assert_eq!(fast, 64);
        assert_eq!(slow, 32);
    }

    #[test]
    fn test_phase_offset_delays_first_fire() {
        let mut tracker = RhythmTracker::new(0);
        tracker.set_rhythm(
            layer("late"),
            LayerRhythmConfig::new(Duration::from_millis(100), 0.5, true).unwrap(),
        );

        // Before the offset, index is still negative
        assert!(tracker.due_layers(40).is_empty());
        // First boundary at offset (index reaches 0)
        assert_eq!(tracker.due_layers(60).len(), 1);
    }
}
