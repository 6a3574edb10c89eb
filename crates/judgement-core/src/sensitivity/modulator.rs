//! Per-tag learning-rate amplification coefficients.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::burst::LrBurst;
use super::bus::BurstSubscriber;
use crate::clock::Clock;

/// One tag's amplification source: the burst parameters that set it.
///
/// Storing the burst parameters (rather than a sampled factor) lets the
/// coefficient decay at read time, so the factor a caller sees is always
/// current without a background sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCoefficient {
    /// Amplification when the burst was applied.
    pub initial_amplification: f32,
    /// Burst half-life in milliseconds.
    pub half_life_ms: u64,
    /// Clock time when the burst was applied.
    pub applied_at_ms: u64,
}

impl TagCoefficient {
    fn from_burst(burst: &LrBurst) -> Self {
        Self {
            initial_amplification: burst.initial_amplification,
            half_life_ms: burst.half_life.as_millis() as u64,
            applied_at_ms: burst.created_at_ms,
        }
    }

    /// Current amplification, decayed toward 1.
    pub fn current(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.applied_at_ms) as f64;
        let decay = (-std::f64::consts::LN_2 * elapsed / self.half_life_ms as f64).exp();
        (1.0 + (self.initial_amplification as f64 - 1.0) * decay) as f32
    }
}

/// Bus subscriber folding bursts into per-tag amplification factors.
///
/// On each burst every mentioned tag's coefficient is overwritten (not
/// accumulated). [`amplification_factor`](Self::amplification_factor)
/// reports the maximum current amplification over a tag set, defaulting
/// to 1.0 for unknown tags, and is intended to multiply the rate the
/// learning-rate policy produced before the signal is dispatched.
pub struct LearningRateModulator {
    coefficients: RwLock<HashMap<String, TagCoefficient>>,
    clock: Arc<dyn Clock>,
}

impl LearningRateModulator {
    /// Create a modulator reading time from the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            coefficients: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Maximum current amplification over `tags`; 1.0 when none match.
    pub fn amplification_factor(&self, tags: &HashSet<String>) -> f32 {
        let now = self.clock.now_ms();
        let coefficients = self.coefficients.read();
        tags.iter()
            .filter_map(|tag| coefficients.get(tag))
            .map(|c| c.current(now))
            .fold(1.0f32, f32::max)
    }

    /// Read-only copy of the coefficient map.
    pub fn snapshot(&self) -> HashMap<String, TagCoefficient> {
        self.coefficients.read().clone()
    }

    /// Drop coefficients that have decayed below the active floor.
    pub fn prune_inactive(&self) {
        let now = self.clock.now_ms();
        self.coefficients
            .write()
            .retain(|_, c| c.current(now) > super::burst::ACTIVE_AMPLIFICATION_FLOOR);
    }
}

impl BurstSubscriber for LearningRateModulator {
    fn on_burst(&self, burst: &LrBurst) {
        let coefficient = TagCoefficient::from_burst(burst);
        let mut coefficients = self.coefficients.write();
        for tag in &burst.tags {
            coefficients.insert(tag.clone(), coefficient.clone());
        }
        debug!(
            tags = ?burst.tags,
            amplification = burst.initial_amplification,
            "burst folded into learning-rate coefficients"
        );
    }
}

impl std::fmt::Debug for LearningRateModulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningRateModulator")
            .field("coefficients", &self.coefficients.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    fn tag_set(tags: &[&str]) -> HashSet<String> {
        tags.iter().map(|s| s.to_string()).collect()
    }

    fn setup() -> (ManualClock, LearningRateModulator) {
        let clock = ManualClock::new();
        let modulator = LearningRateModulator::new(Arc::new(clock.clone()));
        (clock, modulator)
    }

    #[test]
    fn test_unknown_tags_default_to_one() {
        let (_clock, modulator) = setup();
        assert_eq!(modulator.amplification_factor(&tag_set(&["unknown"])), 1.0);
    }

    #[test]
    fn test_burst_sets_tag_factor() {
        let (_clock, modulator) = setup();
        let burst = LrBurst::new(["visual"], 2.0, Duration::from_secs(30), 0).unwrap();
        modulator.on_burst(&burst);

        let factor = modulator.amplification_factor(&tag_set(&["visual"]));
        assert!((factor - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_factor_is_max_over_tags() {
        let (_clock, modulator) = setup();
        modulator.on_burst(&LrBurst::new(["a"], 1.5, Duration::from_secs(30), 0).unwrap());
        modulator.on_burst(&LrBurst::new(["b"], 3.0, Duration::from_secs(30), 0).unwrap());

        let factor = modulator.amplification_factor(&tag_set(&["a", "b", "c"]));
        assert!((factor - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_second_burst_overwrites_not_accumulates() {
        let (clock, modulator) = setup();
        modulator.on_burst(&LrBurst::new(["x"], 3.0, Duration::from_secs(30), 0).unwrap());

        clock.set(100);
        modulator.on_burst(&LrBurst::new(["x"], 1.5, Duration::from_secs(30), 100).unwrap());

        let factor = modulator.amplification_factor(&tag_set(&["x"]));
        assert!((factor - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_factor_decays_at_read_time() {
        let (clock, modulator) = setup();
        modulator.on_burst(&LrBurst::new(["x"], 2.0, Duration::from_secs(30), 0).unwrap());

        clock.set(30_000);
        let factor = modulator.amplification_factor(&tag_set(&["x"]));
        assert!((factor - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_prune_inactive_removes_decayed_tags() {
        let (clock, modulator) = setup();
        modulator.on_burst(&LrBurst::new(["x"], 2.0, Duration::from_secs(30), 0).unwrap());

        clock.set(30_000 * 10);
        modulator.prune_inactive();

        assert!(modulator.snapshot().is_empty());
    }
}
