use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change in a session produces an Event.
/// The CLI prints them; a GUI would poll for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A set was counted toward the goal.
    SetCompleted {
        todo_id: i64,
        completed_sets: u32,
        goal: u32,
        at: DateTime<Utc>,
    },
    /// The set counter was reset to zero.
    CounterReset {
        todo_id: i64,
        at: DateTime<Utc>,
    },
    TimerStarted {
        todo_id: i64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        todo_id: i64,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        todo_id: i64,
        at: DateTime<Utc>,
    },
    /// An inactivity reminder was scheduled (or rescheduled).
    ReminderArmed {
        todo_id: i64,
        due_in_secs: u64,
        at: DateTime<Utc>,
    },
    /// A pending reminder was cancelled before firing.
    ReminderCancelled {
        todo_id: i64,
        at: DateTime<Utc>,
    },
    /// The inactivity delay elapsed and the reminder is now visible.
    ReminderFired {
        todo_id: i64,
        at: DateTime<Utc>,
    },
    /// The visible reminder auto-dismissed after its display delay.
    ReminderDismissed {
        todo_id: i64,
        at: DateTime<Utc>,
    },
    /// The goal was reached and the completion write was issued.
    TodoCompleted {
        todo_id: i64,
        at: DateTime<Utc>,
    },
    /// A manual reset reopened the entry.
    TodoReopened {
        todo_id: i64,
        at: DateTime<Utc>,
    },
    /// Full per-entry state, as consumed by the presentation layer.
    SessionSnapshot {
        todo_id: i64,
        completed_sets: u32,
        goal: u32,
        elapsed_secs: u64,
        timer_running: bool,
        reminder_visible: bool,
        completed: bool,
        at: DateTime<Utc>,
    },
}
