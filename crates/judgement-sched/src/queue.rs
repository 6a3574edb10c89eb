//! Bounded, priority-ordered event queue.
//!
//! The queue keeps events sorted by descending priority with insertion
//! order breaking ties (stable). It is owned and mutated only by the
//! scheduler task; everyone else sees copies via [`EventQueue::snapshot`].

use tracing::trace;

use crate::event::UpdateEvent;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Outcome of a push attempt. A full queue is a counted load condition,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Event was admitted.
    Queued,
    /// Queue was at capacity; event was not admitted.
    Rejected,
}

/// Bounded priority queue of pending update events.
#[derive(Debug)]
pub struct EventQueue {
    events: Vec<(u64, UpdateEvent)>,
    capacity: usize,
    next_seq: u64,
}

impl EventQueue {
    /// Create a queue bounded at `capacity` events (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    /// Insert an event in priority position, or reject when full.
    pub fn push(&mut self, event: UpdateEvent) -> PushOutcome {
        if self.events.len() >= self.capacity {
            trace!(id = %event.id, priority = event.priority, "queue full, event rejected");
            return PushOutcome::Rejected;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        // First index whose priority is strictly lower: equal priorities
        // stay in insertion order.
        let position = self
            .events
            .iter()
            .position(|(_, e)| e.priority < event.priority)
            .unwrap_or(self.events.len());
        self.events.insert(position, (seq, event));
        PushOutcome::Queued
    }

    /// Remove and return the highest-priority event.
    pub fn pull(&mut self) -> Option<UpdateEvent> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0).1)
        }
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all queued events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Copied view of the queued events in dispatch order.
    pub fn snapshot(&self) -> Vec<UpdateEvent> {
        self.events.iter().map(|(_, e)| e.clone()).collect()
    }

    /// Remove every event matching the predicate, returning how many went.
    pub(crate) fn drop_where<F: Fn(&UpdateEvent) -> bool>(&mut self, predicate: F) -> usize {
        let before = self.events.len();
        self.events.retain(|(_, e)| !predicate(e));
        before - self.events.len()
    }

    /// Apply a mutation to every event matching the predicate.
    pub(crate) fn modify_where<P, M>(&mut self, predicate: P, mutate: M) -> usize
    where
        P: Fn(&UpdateEvent) -> bool,
        M: Fn(&mut UpdateEvent),
    {
        let mut touched = 0;
        for (_, event) in self.events.iter_mut() {
            if predicate(event) {
                mutate(event);
                touched += 1;
            }
        }
        touched
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use judgement_core::difference::RelativeDifference;
    use judgement_core::layer::LayerId;
    use judgement_core::pattern::PatternContext;
    use judgement_core::policy::{AdaptiveLearningRate, RateOrigin, UpdateScope};
    use judgement_core::signal::LearningSignal;

    fn event(priority: f32) -> UpdateEvent {
        let signal = LearningSignal::new(
            AdaptiveLearningRate::new(0.01, RateOrigin::Adaptive),
            RelativeDifference::new(0.5, PatternContext::default()).unwrap(),
            UpdateScope::empty(),
        );
        UpdateEvent::new(priority, LayerId::new("target"), signal, 0)
    }

    #[test]
    fn test_pull_returns_highest_priority() {
        let mut queue = EventQueue::default();
        queue.push(event(0.2));
        queue.push(event(0.8));
        queue.push(event(0.5));

        assert_eq!(queue.pull().unwrap().priority, 0.8);
        assert_eq!(queue.pull().unwrap().priority, 0.5);
        assert_eq!(queue.pull().unwrap().priority, 0.2);
        assert!(queue.pull().is_none());
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let mut queue = EventQueue::default();
        let first = event(0.5);
        let second = event(0.5);
        let first_id = first.id;
        let second_id = second.id;

        queue.push(first);
        queue.push(second);

        assert_eq!(queue.pull().unwrap().id, first_id);
        assert_eq!(queue.pull().unwrap().id, second_id);
    }

    #[test]
    fn test_push_rejects_when_full() {
        let mut queue = EventQueue::with_capacity(2);
        assert_eq!(queue.push(event(0.1)), PushOutcome::Queued);
        assert_eq!(queue.push(event(0.2)), PushOutcome::Queued);
        assert_eq!(queue.push(event(0.9)), PushOutcome::Rejected);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_clear_empties_queue() {
        let mut queue = EventQueue::default();
        queue.push(event(0.1));
        queue.push(event(0.2));
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_snapshot_is_dispatch_ordered_copy() {
        let mut queue = EventQueue::default();
        queue.push(event(0.3));
        queue.push(event(0.7));

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].priority, 0.7);
        // Snapshot does not consume
        assert_eq!(queue.len(), 2);
    }
}
