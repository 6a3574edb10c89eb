//! Relative difference between an expected and an observed pattern.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::pattern::PatternContext;

/// One divergence measurement, produced per judgement call and immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeDifference {
    /// Divergence magnitude, finite and ≥ 0.
    magnitude: f32,
    /// Merged context of the two patterns involved.
    context: PatternContext,
    /// Free-form metadata (metric name, originating link, ...).
    metadata: HashMap<String, String>,
    /// Wall-clock time of the measurement.
    measured_at: DateTime<Utc>,
}

impl RelativeDifference {
    /// Create a difference, rejecting negative or non-finite magnitudes.
    pub fn new(magnitude: f32, context: PatternContext) -> CoreResult<Self> {
        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(CoreError::InvalidMagnitude { value: magnitude });
        }
        Ok(Self {
            magnitude,
            context,
            metadata: HashMap::new(),
            measured_at: Utc::now(),
        })
    }

    /// Attach a metadata entry, builder style.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Divergence magnitude.
    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    /// Merged pattern context.
    pub fn context(&self) -> &PatternContext {
        &self.context
    }

    /// Metadata map.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Measurement timestamp.
    pub fn measured_at(&self) -> DateTime<Utc> {
        self.measured_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_accepts_zero_magnitude() {
        let diff = RelativeDifference::new(0.0, PatternContext::default()).unwrap();
        assert_eq!(diff.magnitude(), 0.0);
    }

    #[test]
    fn test_difference_rejects_negative_magnitude() {
        let err = RelativeDifference::new(-0.1, PatternContext::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidMagnitude { .. }));
    }

    #[test]
    fn test_difference_rejects_nan_magnitude() {
        let err = RelativeDifference::new(f32::NAN, PatternContext::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidMagnitude { .. }));
    }

    #[test]
    fn test_difference_metadata_builder() {
        let diff = RelativeDifference::new(1.0, PatternContext::default())
            .unwrap()
            .with_metadata("metric", "cosine");
        assert_eq!(diff.metadata()["metric"], "cosine");
    }
}
