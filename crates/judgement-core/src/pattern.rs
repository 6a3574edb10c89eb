//! Patterns and the merged context attached to a judgement.
//!
//! A [`Pattern`] is what a layer predicts (expected) or observes (actual):
//! a numeric body plus free-form tags and named statistics. When a link
//! judges an (expected, actual) pair it merges both patterns' tags and
//! statistics into a single [`PatternContext`] that travels with the
//! resulting difference.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A predicted or observed pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Numeric body of the pattern.
    pub body: Vec<f32>,
    /// Free-form tags (e.g. modality or feature labels).
    pub tags: HashSet<String>,
    /// Named statistics attached by the producing layer.
    pub statistics: HashMap<String, f64>,
}

impl Pattern {
    /// Create a pattern with an empty tag set and no statistics.
    pub fn new(body: Vec<f32>) -> Self {
        Self {
            body,
            tags: HashSet::new(),
            statistics: HashMap::new(),
        }
    }

    /// Add a tag, builder style.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Add a statistic, builder style.
    pub fn with_statistic(mut self, key: impl Into<String>, value: f64) -> Self {
        self.statistics.insert(key.into(), value);
        self
    }
}

/// Merged view of the two patterns involved in one judgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternContext {
    /// Union of both patterns' tags.
    pub tags: HashSet<String>,
    /// Merged statistics; on key collision the actual pattern wins.
    pub statistics: HashMap<String, f64>,
}

impl PatternContext {
    /// Merge the expected and actual patterns' tags and statistics.
    ///
    /// Statistics merge is last-write-wins: the actual pattern's entries
    /// are applied after the expected pattern's.
    pub fn merged(expected: &Pattern, actual: &Pattern) -> Self {
        let mut tags = expected.tags.clone();
        tags.extend(actual.tags.iter().cloned());

        let mut statistics = expected.statistics.clone();
        statistics.extend(
            actual
                .statistics
                .iter()
                .map(|(k, v)| (k.clone(), *v)),
        );

        Self { tags, statistics }
    }

    /// Check whether the context carries a given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
