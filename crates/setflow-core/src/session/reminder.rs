//! Inactivity reminder scheduling for one entry.
//!
//! Each counted set arms a one-shot notification due a fixed delay later.
//! A newer set cancels the previous schedule (debounce - only the latest
//! increment's timer survives). When the notification fires it stays
//! visible for a short display delay and then auto-dismisses.
//!
//! Like the rest timer, this is wall-clock-based with no internal
//! threads: deadlines are checked by `tick()`.

use serde::{Deserialize, Serialize};

use super::now_ms;

/// Handle to one scheduled deadline.
///
/// `cancel` is idempotent; a cancelled handle never comes due.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Oneshot {
    due_epoch_ms: u64,
    cancelled: bool,
}

impl Oneshot {
    fn new(due_epoch_ms: u64) -> Self {
        Self {
            due_epoch_ms,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    fn is_due_at(&self, now_ms: u64) -> bool {
        !self.cancelled && now_ms >= self.due_epoch_ms
    }

    fn is_live(&self) -> bool {
        !self.cancelled
    }
}

/// Delay before a reminder fires and how long it stays visible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReminderTiming {
    pub delay_ms: u64,
    pub display_ms: u64,
}

impl Default for ReminderTiming {
    fn default() -> Self {
        Self {
            delay_ms: 30_000,
            display_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderState {
    /// Nothing scheduled.
    Idle,
    /// A notification is pending.
    Armed,
    /// The notification is visible, auto-dismiss pending.
    Showing,
}

/// What a tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderTick {
    /// The inactivity delay elapsed; the notification is now visible.
    Fired,
    /// The display delay elapsed; the notification is hidden again.
    Dismissed,
}

/// Per-entry inactivity reminder state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InactivityReminder {
    timing: ReminderTiming,
    /// Pending notification, if any. At most one is live at a time.
    pending: Option<Oneshot>,
    /// Pending auto-dismiss while the notification is visible.
    dismiss: Option<Oneshot>,
}

impl InactivityReminder {
    pub fn new(timing: ReminderTiming) -> Self {
        Self {
            timing,
            pending: None,
            dismiss: None,
        }
    }

    pub fn timing(&self) -> ReminderTiming {
        self.timing
    }

    pub fn state(&self) -> ReminderState {
        if self.dismiss.as_ref().is_some_and(Oneshot::is_live) {
            ReminderState::Showing
        } else if self.pending.as_ref().is_some_and(Oneshot::is_live) {
            ReminderState::Armed
        } else {
            ReminderState::Idle
        }
    }

    /// Whether the notification is currently visible.
    pub fn visible(&self) -> bool {
        self.state() == ReminderState::Showing
    }

    /// Schedule the notification, cancelling any previous schedule.
    ///
    /// Rearming while already armed is the normal debounce path, not an
    /// error.
    pub fn rearm(&mut self) {
        self.rearm_at(now_ms());
    }

    pub fn rearm_at(&mut self, now_ms: u64) {
        if let Some(previous) = self.pending.as_mut() {
            previous.cancel();
        }
        self.pending = Some(Oneshot::new(now_ms + self.timing.delay_ms));
    }

    /// Cancel the pending notification without firing it.
    ///
    /// Returns whether a live schedule was cancelled. A notification that
    /// is already visible keeps its display delay and dismisses on its
    /// own.
    pub fn cancel(&mut self) -> bool {
        match self.pending.as_mut() {
            Some(handle) if handle.is_live() => {
                handle.cancel();
                true
            }
            _ => false,
        }
    }

    /// Cancel every outstanding handle. Used at session teardown; nothing
    /// may fire afterwards.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.pending.as_mut() {
            handle.cancel();
        }
        if let Some(handle) = self.dismiss.as_mut() {
            handle.cancel();
        }
    }

    /// Check deadlines against the clock.
    pub fn tick(&mut self) -> Option<ReminderTick> {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now_ms: u64) -> Option<ReminderTick> {
        if self.pending.as_ref().is_some_and(|h| h.is_due_at(now_ms)) {
            self.pending = None;
            self.dismiss = Some(Oneshot::new(now_ms + self.timing.display_ms));
            return Some(ReminderTick::Fired);
        }
        if self.dismiss.as_ref().is_some_and(|h| h.is_due_at(now_ms)) {
            self.dismiss = None;
            return Some(ReminderTick::Dismissed);
        }
        None
    }
}
