//! The policy triad: skip, learning-rate, and update-scope decisions.
//!
//! Each policy is a pure strategy mapping a [`RelativeDifference`] to one
//! decision. Concrete implementations validate their parameters at
//! construction time and never fail at call time for well-formed input.
//!
//! # Decision pipeline
//!
//! ```text
//! RelativeDifference ── SkipPolicy ──► SkipDecision
//!                    ── LearningRatePolicy ──► AdaptiveLearningRate
//!                    ── UpdateScopePolicy ──► UpdateScope
//! ```
//!
//! The skip decision is evaluated first by [`crate::link::JudgementLink`];
//! a `FullSkip` short-circuits the other two policies entirely.

mod rate;
mod scope;
mod skip;

pub use rate::{FixedRatePolicy, ProportionalRatePolicy, DEFAULT_BASE_RATE, DEFAULT_MAX_RATE};
pub use scope::{FullScopePolicy, ThresholdScopePolicy};
pub use skip::{SimpleSkipStrategy, DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::difference::RelativeDifference;
use crate::error::CoreResult;

/// Tri-state urgency classification, totally ordered by urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipDecision {
    /// Divergence too small to act on; skip all downstream work.
    FullSkip,
    /// Moderate divergence; perform a partial model update.
    PartialUpdate,
    /// Large divergence; perform a focused, full-depth calculation.
    FocusedCalculation,
}

impl SkipDecision {
    /// Whether any downstream work should happen at all.
    pub fn should_process(&self) -> bool {
        !matches!(self, SkipDecision::FullSkip)
    }
}

/// Where a learning-rate value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrigin {
    /// Configured starting value.
    Initial,
    /// Explicitly set by an operator or caller.
    Manual,
    /// Derived from an observed divergence.
    Adaptive,
}

/// A learning-rate decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveLearningRate {
    /// The rate itself, ≥ 0.
    pub value: f32,
    /// Provenance of the value.
    pub origin: RateOrigin,
}

impl AdaptiveLearningRate {
    /// Create a rate, clamping negatives to 0.
    pub fn new(value: f32, origin: RateOrigin) -> Self {
        Self {
            value: value.max(0.0),
            origin,
        }
    }

    /// A rate carrying a configured starting value, before any
    /// divergence has been observed.
    pub fn initial(value: f32) -> Self {
        Self::new(value, RateOrigin::Initial)
    }

    /// Return a copy with the value multiplied by `factor` (≥ 0).
    pub fn amplified(&self, factor: f32) -> Self {
        Self {
            value: self.value * factor.max(0.0),
            origin: self.origin,
        }
    }
}

/// Which parameter groups an update should touch. May be empty (no-op).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateScope {
    /// Names of the parameter groups to update.
    pub targets: BTreeSet<String>,
}

impl UpdateScope {
    /// Empty scope: nothing to update.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scope over the given target names.
    pub fn of<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the scope touches nothing.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of targeted parameter groups.
    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

/// Classifies how much work a divergence warrants.
pub trait SkipPolicy: Send + Sync {
    /// Map a difference to a skip decision.
    fn judge(&self, difference: &RelativeDifference) -> SkipDecision;
}

/// Derives an adaptive learning rate from a divergence.
pub trait LearningRatePolicy: Send + Sync {
    /// Map a difference to a learning rate.
    fn adjust(&self, difference: &RelativeDifference) -> CoreResult<AdaptiveLearningRate>;
}

/// Decides which parameter groups an update should touch.
pub trait UpdateScopePolicy: Send + Sync {
    /// Map a difference to an update scope.
    fn scope(&self, difference: &RelativeDifference) -> CoreResult<UpdateScope>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_decision_urgency_order() {
        assert!(SkipDecision::FullSkip < SkipDecision::PartialUpdate);
        assert!(SkipDecision::PartialUpdate < SkipDecision::FocusedCalculation);
    }

    #[test]
    fn test_skip_decision_should_process() {
        assert!(!SkipDecision::FullSkip.should_process());
        assert!(SkipDecision::PartialUpdate.should_process());
        assert!(SkipDecision::FocusedCalculation.should_process());
    }

    #[test]
    fn test_rate_clamps_negative() {
        let rate = AdaptiveLearningRate::new(-0.5, RateOrigin::Manual);
        assert_eq!(rate.value, 0.0);
    }

    #[test]
    fn test_initial_rate_origin() {
        let rate = AdaptiveLearningRate::initial(DEFAULT_BASE_RATE);
        assert_eq!(rate.origin, RateOrigin::Initial);
        assert_eq!(rate.value, DEFAULT_BASE_RATE);
    }

    #[test]
    fn test_rate_amplified() {
        let rate = AdaptiveLearningRate::new(0.1, RateOrigin::Adaptive);
        let boosted = rate.amplified(2.0);
        assert!((boosted.value - 0.2).abs() < 1e-7);
        assert_eq!(boosted.origin, RateOrigin::Adaptive);
    }

    #[test]
    fn test_scope_of_and_empty() {
        let scope = UpdateScope::of(["weights", "bias"]);
        assert_eq!(scope.len(), 2);
        assert!(!scope.is_empty());
        assert!(UpdateScope::empty().is_empty());
    }
}
