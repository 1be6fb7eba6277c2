//! Completed-set counter for one entry.

use serde::{Deserialize, Serialize};

/// Counts completed sets against a fixed goal.
///
/// The count is clamped at the goal: incrementing past it is a no-op, and
/// the only way down is [`SetCounter::reset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCounter {
    completed: u32,
    goal: u32,
}

impl SetCounter {
    pub fn new(goal: u32) -> Self {
        Self { completed: 0, goal }
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn goal(&self) -> u32 {
        self.goal
    }

    pub fn goal_reached(&self) -> bool {
        self.completed >= self.goal
    }

    /// Count one more set.
    ///
    /// Returns the new count, or `None` if the goal was already reached
    /// (a no-op, not an error).
    pub fn increment(&mut self) -> Option<u32> {
        if self.completed < self.goal {
            self.completed += 1;
            Some(self.completed)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.completed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn increments_up_to_goal() {
        let mut counter = SetCounter::new(3);
        assert_eq!(counter.increment(), Some(1));
        assert_eq!(counter.increment(), Some(2));
        assert_eq!(counter.increment(), Some(3));
        assert!(counter.goal_reached());
    }

    #[test]
    fn increment_past_goal_is_noop() {
        let mut counter = SetCounter::new(2);
        counter.increment();
        counter.increment();
        assert_eq!(counter.increment(), None);
        assert_eq!(counter.completed(), 2);
    }

    #[test]
    fn zero_goal_is_reached_immediately() {
        let mut counter = SetCounter::new(0);
        assert!(counter.goal_reached());
        assert_eq!(counter.increment(), None);
        assert_eq!(counter.completed(), 0);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut counter = SetCounter::new(3);
        counter.increment();
        counter.increment();
        counter.reset();
        assert_eq!(counter.completed(), 0);
        assert!(!counter.goal_reached());
    }

    proptest! {
        /// Any sequence of increments keeps the count within [0, goal],
        /// and the count never decreases except through reset.
        #[test]
        fn count_never_exceeds_goal(goal in 0u32..100, attempts in 0usize..300) {
            let mut counter = SetCounter::new(goal);
            let mut previous = 0;
            for _ in 0..attempts {
                counter.increment();
                prop_assert!(counter.completed() <= goal);
                prop_assert!(counter.completed() >= previous);
                previous = counter.completed();
            }
            prop_assert_eq!(counter.completed(), (attempts as u32).min(goal));
        }
    }
}
