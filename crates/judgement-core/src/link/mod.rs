//! Judgement links between layer pairs.
//!
//! A [`JudgementLink`] orchestrates one (upper-layer, lower-layer) pair:
//! it computes the relative difference with its configured metric, asks the
//! skip policy whether the divergence is worth acting on, and only then
//! invokes the rate and scope policies. Every call appends one record to a
//! bounded per-link history from which running statistics are derived.
//!
//! Links are independent: each owns its history exclusively, so no
//! cross-link synchronization is needed.

mod history;

pub use history::{JudgementHistory, JudgementRecord, DEFAULT_HISTORY_CAPACITY};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::difference::RelativeDifference;
use crate::error::{CoreError, CoreResult};
use crate::layer::LayerId;
use crate::metrics::DistanceMetric;
use crate::pattern::{Pattern, PatternContext};
use crate::policy::{
    AdaptiveLearningRate, LearningRatePolicy, RateOrigin, SkipDecision, SkipPolicy, UpdateScope,
    UpdateScopePolicy,
};

/// Learning rate recorded for a fully skipped judgement.
pub const SKIPPED_LEARNING_RATE: f32 = 1e-6;

/// Window within which a record counts as recent activity.
const RECENT_ACTIVITY_WINDOW_MINUTES: i64 = 10;

/// Identifier of a judgement link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Generate a fresh link id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Result of a comprehensive judgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgementOutcome {
    /// The measured divergence.
    pub difference: RelativeDifference,
    /// Decided learning rate (near-zero sentinel when skipped).
    pub learning_rate: AdaptiveLearningRate,
    /// Decided update scope (empty when skipped).
    pub update_scope: UpdateScope,
    /// The skip classification.
    pub skip_decision: SkipDecision,
    /// Whether a learning signal should be propagated at all.
    pub should_process: bool,
}

/// Aggregated view over a link's judgement history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStatistics {
    /// Total retained judgements.
    pub total: usize,
    /// Count of full skips.
    pub full_skips: usize,
    /// Count of partial updates.
    pub partial_updates: usize,
    /// Count of focused calculations.
    pub focused_calculations: usize,
    /// Mean divergence magnitude over retained records.
    pub average_magnitude: f32,
    /// Mean learning rate over retained records.
    pub average_learning_rate: f32,
    /// Whether any record landed within the last 10 minutes.
    pub recent_activity: bool,
}

/// Orchestrates judgement for one (upper, lower) layer pair.
pub struct JudgementLink {
    id: LinkId,
    upper_layer: LayerId,
    lower_layer: LayerId,
    metric: Arc<dyn DistanceMetric>,
    skip_policy: Arc<dyn SkipPolicy>,
    rate_policy: Arc<dyn LearningRatePolicy>,
    scope_policy: Arc<dyn UpdateScopePolicy>,
    history: JudgementHistory,
    metadata: HashMap<String, String>,
}

impl JudgementLink {
    /// Create a link with the default history capacity.
    pub fn new(
        upper_layer: LayerId,
        lower_layer: LayerId,
        metric: Arc<dyn DistanceMetric>,
        skip_policy: Arc<dyn SkipPolicy>,
        rate_policy: Arc<dyn LearningRatePolicy>,
        scope_policy: Arc<dyn UpdateScopePolicy>,
    ) -> Self {
        Self::with_history_capacity(
            upper_layer,
            lower_layer,
            metric,
            skip_policy,
            rate_policy,
            scope_policy,
            DEFAULT_HISTORY_CAPACITY,
        )
    }

    /// Create a link with a custom history capacity.
    #[allow(clippy::too_many_arguments)]
    pub fn with_history_capacity(
        upper_layer: LayerId,
        lower_layer: LayerId,
        metric: Arc<dyn DistanceMetric>,
        skip_policy: Arc<dyn SkipPolicy>,
        rate_policy: Arc<dyn LearningRatePolicy>,
        scope_policy: Arc<dyn UpdateScopePolicy>,
        history_capacity: usize,
    ) -> Self {
        Self {
            id: LinkId::generate(),
            upper_layer,
            lower_layer,
            metric,
            skip_policy,
            rate_policy,
            scope_policy,
            history: JudgementHistory::with_capacity(history_capacity),
            metadata: HashMap::new(),
        }
    }

    /// Link id.
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Upper (predicting) layer id.
    pub fn upper_layer(&self) -> &LayerId {
        &self.upper_layer
    }

    /// Lower (observed) layer id.
    pub fn lower_layer(&self) -> &LayerId {
        &self.lower_layer
    }

    /// Mutable metadata map for integration bookkeeping.
    pub fn metadata_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.metadata
    }

    /// Replace the skip policy at runtime.
    pub fn set_skip_policy(&mut self, policy: Arc<dyn SkipPolicy>) {
        self.skip_policy = policy;
    }

    /// Replace the learning-rate policy at runtime.
    pub fn set_rate_policy(&mut self, policy: Arc<dyn LearningRatePolicy>) {
        self.rate_policy = policy;
    }

    /// Replace the update-scope policy at runtime.
    pub fn set_scope_policy(&mut self, policy: Arc<dyn UpdateScopePolicy>) {
        self.scope_policy = policy;
    }

    /// Compute the relative difference between an expected and an actual
    /// pattern, merging their tags and statistics into the result context.
    pub fn calculate_relative_difference(
        &self,
        expected: &Pattern,
        actual: &Pattern,
    ) -> CoreResult<RelativeDifference> {
        if expected.body.is_empty() {
            return Err(CoreError::EmptyPattern { side: "expected" });
        }
        if actual.body.is_empty() {
            return Err(CoreError::EmptyPattern { side: "actual" });
        }

        let magnitude = self.metric.distance(&expected.body, &actual.body)?;
        let context = PatternContext::merged(expected, actual);

        trace!(
            link = %self.id,
            metric = self.metric.name(),
            magnitude,
            "relative difference computed"
        );

        Ok(RelativeDifference::new(magnitude, context)?
            .with_metadata("metric", self.metric.name())
            .with_metadata("link", self.id.to_string()))
    }

    /// Classify how much work the difference warrants.
    pub fn judge_calculation_skip(&self, difference: &RelativeDifference) -> SkipDecision {
        self.skip_policy.judge(difference)
    }

    /// Derive the learning rate for a difference.
    pub fn adjust_learning_rate(
        &self,
        difference: &RelativeDifference,
    ) -> CoreResult<AdaptiveLearningRate> {
        self.rate_policy.adjust(difference)
    }

    /// Derive the update scope for a difference.
    pub fn determine_update_scope(
        &self,
        difference: &RelativeDifference,
    ) -> CoreResult<UpdateScope> {
        self.scope_policy.scope(difference)
    }

    /// Run the full pipeline: difference → skip → rate + scope.
    ///
    /// The skip check runs first; on `FullSkip` the rate and scope policies
    /// are not invoked and a minimal outcome is returned. Every call,
    /// skipped or not, appends exactly one history record.
    pub fn perform_comprehensive_judgement(
        &mut self,
        expected: &Pattern,
        actual: &Pattern,
    ) -> CoreResult<JudgementOutcome> {
        let difference = self.calculate_relative_difference(expected, actual)?;
        let skip_decision = self.judge_calculation_skip(&difference);

        let outcome = if skip_decision == SkipDecision::FullSkip {
            debug!(
                link = %self.id,
                magnitude = difference.magnitude(),
                "judgement skipped below threshold"
            );
            JudgementOutcome {
                difference,
                learning_rate: AdaptiveLearningRate::new(
                    SKIPPED_LEARNING_RATE,
                    RateOrigin::Adaptive,
                ),
                update_scope: UpdateScope::empty(),
                skip_decision,
                should_process: false,
            }
        } else {
            let learning_rate = self.adjust_learning_rate(&difference)?;
            let update_scope = self.determine_update_scope(&difference)?;
            debug!(
                link = %self.id,
                magnitude = difference.magnitude(),
                rate = learning_rate.value,
                scope = update_scope.len(),
                ?skip_decision,
                "judgement complete"
            );
            JudgementOutcome {
                difference,
                learning_rate,
                update_scope,
                skip_decision,
                should_process: true,
            }
        };

        self.history.push(JudgementRecord {
            recorded_at: Utc::now(),
            magnitude: outcome.difference.magnitude(),
            learning_rate: outcome.learning_rate.value,
            scope_size: outcome.update_scope.len(),
            skip_decision: outcome.skip_decision,
        });

        Ok(outcome)
    }

    /// Copied snapshot of the judgement history, oldest-first.
    pub fn judgement_history(&self) -> Vec<JudgementRecord> {
        self.history.snapshot()
    }

    /// Aggregate the retained history into running statistics.
    pub fn statistics(&self) -> LinkStatistics {
        let total = self.history.len();
        if total == 0 {
            return LinkStatistics {
                total: 0,
                full_skips: 0,
                partial_updates: 0,
                focused_calculations: 0,
                average_magnitude: 0.0,
                average_learning_rate: 0.0,
                recent_activity: false,
            };
        }

        let mut full_skips = 0;
        let mut partial_updates = 0;
        let mut focused_calculations = 0;
        let mut magnitude_sum = 0.0f64;
        let mut rate_sum = 0.0f64;
        let recent_cutoff = Utc::now() - ChronoDuration::minutes(RECENT_ACTIVITY_WINDOW_MINUTES);
        let mut recent_activity = false;

        for record in self.history.iter() {
            match record.skip_decision {
                SkipDecision::FullSkip => full_skips += 1,
                SkipDecision::PartialUpdate => partial_updates += 1,
                SkipDecision::FocusedCalculation => focused_calculations += 1,
            }
            magnitude_sum += record.magnitude as f64;
            rate_sum += record.learning_rate as f64;
            if record.recorded_at >= recent_cutoff {
                recent_activity = true;
            }
        }

        LinkStatistics {
            total,
            full_skips,
            partial_updates,
            focused_calculations,
            average_magnitude: (magnitude_sum / total as f64) as f32,
            average_learning_rate: (rate_sum / total as f64) as f32,
            recent_activity,
        }
    }
}

impl std::fmt::Debug for JudgementLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgementLink")
            .field("id", &self.id)
            .field("upper_layer", &self.upper_layer)
            .field("lower_layer", &self.lower_layer)
            .field("metric", &self.metric.name())
            .field("history_len", &self.history.len())
            .finish()
    }
}
