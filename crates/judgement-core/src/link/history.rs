//! Bounded judgement history.
//!
//! Fixed-capacity ring buffer over a preallocated arena: appends are O(1)
//! and eviction overwrites the oldest slot in place instead of shifting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::SkipDecision;

/// Default history capacity per link.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// One history entry: the outcome of a single judgement call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgementRecord {
    /// When the judgement was made.
    pub recorded_at: DateTime<Utc>,
    /// Divergence magnitude.
    pub magnitude: f32,
    /// Learning rate decided (near-zero for skipped judgements).
    pub learning_rate: f32,
    /// Number of parameter groups in the decided scope.
    pub scope_size: usize,
    /// The skip classification.
    pub skip_decision: SkipDecision,
}

/// Fixed-capacity FIFO ring buffer of judgement records.
#[derive(Debug, Clone)]
pub struct JudgementHistory {
    slots: Vec<JudgementRecord>,
    capacity: usize,
    /// Index of the oldest record once the buffer has wrapped.
    head: usize,
    wrapped: bool,
}

impl JudgementHistory {
    /// Create a history bounded at `capacity` records (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            wrapped: false,
        }
    }

    /// Append a record, evicting the oldest when at capacity.
    pub fn push(&mut self, record: JudgementRecord) {
        if self.slots.len() < self.capacity {
            self.slots.push(record);
        } else {
            self.slots[self.head] = record;
            self.head = (self.head + 1) % self.capacity;
            self.wrapped = true;
        }
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate records oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &JudgementRecord> {
        let (older, newer) = if self.wrapped {
            self.slots.split_at(self.head)
        } else {
            self.slots.split_at(0)
        };
        newer.iter().chain(older.iter())
    }

    /// Copied snapshot, oldest-first.
    pub fn snapshot(&self) -> Vec<JudgementRecord> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(magnitude: f32) -> JudgementRecord {
        JudgementRecord {
            recorded_at: Utc::now(),
            magnitude,
            learning_rate: 0.01,
            scope_size: 1,
            skip_decision: SkipDecision::PartialUpdate,
        }
    }

    #[test]
    fn test_history_appends_in_order() {
        let mut history = JudgementHistory::with_capacity(10);
        for i in 0..3 {
            history.push(record(i as f32));
        }
        let magnitudes: Vec<f32> = history.iter().map(|r| r.magnitude).collect();
        assert_eq!(magnitudes, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_history_evicts_oldest_first() {
        let mut history = JudgementHistory::with_capacity(100);
        for i in 0..101 {
            history.push(record(i as f32));
        }

        assert_eq!(history.len(), 100);
        let snapshot = history.snapshot();
        assert_eq!(snapshot.first().map(|r| r.magnitude), Some(1.0));
        assert_eq!(snapshot.last().map(|r| r.magnitude), Some(100.0));
    }

    #[test]
    fn test_history_wraparound_order_stays_fifo() {
        let mut history = JudgementHistory::with_capacity(3);
        for i in 0..8 {
            history.push(record(i as f32));
        }

        let magnitudes: Vec<f32> = history.iter().map(|r| r.magnitude).collect();
        assert_eq!(magnitudes, vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_history_zero_capacity_clamps_to_one() {
        let mut history = JudgementHistory::with_capacity(0);
        history.push(record(1.0));
        history.push(record(2.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.snapshot()[0].magnitude, 2.0);
    }
}
