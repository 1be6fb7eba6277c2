//! Completion reconciliation between session state and the todo store.
//!
//! The reconciler turns counter changes into store writes at exactly two
//! points: the edge where the count first reaches the goal, and a manual
//! reset. Every other observation produces no write.

use serde::{Deserialize, Serialize};

use crate::todo::Todo;

/// Edge-triggered completion tracker for one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReconciler {
    /// Mirrors `Todo.completed`; may lead the store by the one write
    /// currently being issued.
    local_completed: bool,
}

impl CompletionReconciler {
    /// Initialize from the persisted completion flag. An entry loaded as
    /// completed never re-issues the completion write.
    pub fn new(persisted_completed: bool) -> Self {
        Self {
            local_completed: persisted_completed,
        }
    }

    pub fn completed(&self) -> bool {
        self.local_completed
    }

    /// Observe the count after a change.
    ///
    /// Returns the full update payload exactly once per crossing from
    /// below-goal to at-or-above-goal; `None` while the count stays on
    /// either side.
    pub fn observe(&mut self, completed_sets: u32, todo: &Todo) -> Option<Todo> {
        if self.local_completed || completed_sets < todo.sets {
            return None;
        }
        self.local_completed = true;
        let mut updated = todo.clone();
        updated.completed = true;
        Some(updated)
    }

    /// Manual override: mark the entry incomplete unconditionally.
    ///
    /// Always returns an update payload, regardless of prior state - the
    /// caller issues exactly one incomplete write per reset.
    pub fn reset(&mut self, todo: &Todo) -> Todo {
        self.local_completed = false;
        let mut updated = todo.clone();
        updated.completed = false;
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn todo(sets: u32, completed: bool) -> Todo {
        Todo {
            id: 1,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
            title: "Bench Press".to_string(),
            description: String::new(),
            sets,
            completed,
        }
    }

    #[test]
    fn fires_once_on_crossing() {
        let mut rec = CompletionReconciler::new(false);
        let todo = todo(3, false);

        assert!(rec.observe(1, &todo).is_none());
        assert!(rec.observe(2, &todo).is_none());

        let update = rec.observe(3, &todo).expect("completion write");
        assert!(update.completed);
        assert_eq!(update.id, todo.id);
        assert_eq!(update.user_id, todo.user_id);
        assert_eq!(update.sets, todo.sets);

        // No re-fire while the count stays at or above goal.
        assert!(rec.observe(3, &todo).is_none());
        assert!(rec.observe(3, &todo).is_none());
    }

    #[test]
    fn already_completed_entry_never_rewrites() {
        let mut rec = CompletionReconciler::new(true);
        let todo = todo(2, true);
        assert!(rec.observe(2, &todo).is_none());
    }

    #[test]
    fn reset_is_unconditional() {
        let mut rec = CompletionReconciler::new(false);
        let todo = todo(3, false);

        // Reset from 0/incomplete still issues the write.
        let update = rec.reset(&todo);
        assert!(!update.completed);

        // Reset after completion reopens and re-enables the edge.
        rec.observe(3, &todo).expect("completion write");
        let update = rec.reset(&todo);
        assert!(!update.completed);
        assert!(!rec.completed());
        assert!(rec.observe(3, &todo).is_some());
    }
}
