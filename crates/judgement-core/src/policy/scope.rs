//! Update-scope policies.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{UpdateScope, UpdateScopePolicy};
use crate::difference::RelativeDifference;
use crate::error::CoreResult;

/// Scope widens with divergence: a small difference touches only the
/// `partial_targets` groups, a difference at or above `threshold` touches
/// the wider `focused_targets` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdScopePolicy {
    partial_targets: BTreeSet<String>,
    focused_targets: BTreeSet<String>,
    threshold: f32,
}

impl ThresholdScopePolicy {
    /// Create a policy switching between the two target sets at `threshold`.
    pub fn new<I, J, S>(partial_targets: I, focused_targets: J, threshold: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            partial_targets: partial_targets.into_iter().map(Into::into).collect(),
            focused_targets: focused_targets.into_iter().map(Into::into).collect(),
            threshold: threshold.max(0.0),
        }
    }
}

impl Default for ThresholdScopePolicy {
    fn default() -> Self {
        Self::new(
            ["output"],
            ["output", "hidden", "attention"],
            0.5,
        )
    }
}

impl UpdateScopePolicy for ThresholdScopePolicy {
    fn scope(&self, difference: &RelativeDifference) -> CoreResult<UpdateScope> {
        let targets = if difference.magnitude() < self.threshold {
            self.partial_targets.clone()
        } else {
            self.focused_targets.clone()
        };
        Ok(UpdateScope { targets })
    }
}

/// Constant scope, independent of the divergence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullScopePolicy {
    targets: BTreeSet<String>,
}

impl FullScopePolicy {
    /// Create a policy always returning the given target set.
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }
}

impl UpdateScopePolicy for FullScopePolicy {
    fn scope(&self, _difference: &RelativeDifference) -> CoreResult<UpdateScope> {
        Ok(UpdateScope {
            targets: self.targets.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternContext;

    fn diff(magnitude: f32) -> RelativeDifference {
        RelativeDifference::new(magnitude, PatternContext::default()).unwrap()
    }

    #[test]
    fn test_threshold_scope_widens_with_magnitude() {
        let policy = ThresholdScopePolicy::new(["output"], ["output", "hidden"], 0.5);

        let narrow = policy.scope(&diff(0.1)).unwrap();
        let wide = policy.scope(&diff(0.9)).unwrap();

        assert_eq!(narrow.len(), 1);
        assert_eq!(wide.len(), 2);
        assert!(wide.targets.contains("hidden"));
    }

    #[test]
    fn test_threshold_scope_boundary_is_focused() {
        let policy = ThresholdScopePolicy::new(["a"], ["a", "b"], 0.5);
        let scope = policy.scope(&diff(0.5)).unwrap();
        assert_eq!(scope.len(), 2);
    }

    #[test]
    fn test_full_scope_is_constant() {
        let policy = FullScopePolicy::new(["weights"]);
        let a = policy.scope(&diff(0.0)).unwrap();
        let b = policy.scope(&diff(5.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_scope_is_allowed() {
        let policy = FullScopePolicy::new(Vec::<String>::new());
        let scope = policy.scope(&diff(1.0)).unwrap();
        assert!(scope.is_empty());
    }
}
