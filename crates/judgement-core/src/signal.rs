//! Learning signals sent to target layers.

use serde::{Deserialize, Serialize};

use crate::difference::RelativeDifference;
use crate::policy::{AdaptiveLearningRate, UpdateScope};

/// The bundle a judgement sends downstream, consumed once by the target
/// layer's `update_predictive_model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSignal {
    /// Rate to apply, already amplified by any active bursts.
    pub rate: AdaptiveLearningRate,
    /// The divergence that triggered the update.
    pub difference: RelativeDifference,
    /// Parameter groups the update should touch.
    pub scope: UpdateScope,
}

impl LearningSignal {
    /// Bundle a rate, difference, and scope.
    pub fn new(
        rate: AdaptiveLearningRate,
        difference: RelativeDifference,
        scope: UpdateScope,
    ) -> Self {
        Self {
            rate,
            difference,
            scope,
        }
    }
}
