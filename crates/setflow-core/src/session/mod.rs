//! Per-entry session tracking.
//!
//! A [`WorkoutSession`] composes the set counter, rest stopwatch,
//! inactivity reminder, and completion reconciler for one todo. The
//! [`SessionManager`] owns the id-keyed map of sessions plus the todo
//! store and is the surface the presentation layer calls.
//!
//! ## Model
//!
//! Everything is single-threaded and caller-ticked. Session operations
//! run their side effects in a fixed order (counter, then reminder, then
//! reconciler), so there is no change-observation machinery and no
//! ambiguity about firing order. Store writes happen only at the
//! completion edge and on manual reset.

mod counter;
mod reconciler;
mod reminder;
mod rest_timer;

pub use counter::SetCounter;
pub use reconciler::CompletionReconciler;
pub use reminder::{InactivityReminder, Oneshot, ReminderState, ReminderTick, ReminderTiming};
pub use rest_timer::RestTimer;

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, DatabaseError};
use crate::events::Event;
use crate::storage::TodoStore;
use crate::todo::Todo;

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Session state machine for one entry.
///
/// Owns the ephemeral per-card state; the persisted fields stay in the
/// store and are only written at the completion edge and on reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    todo: Todo,
    counter: SetCounter,
    rest_timer: RestTimer,
    reminder: InactivityReminder,
    reconciler: CompletionReconciler,
}

impl WorkoutSession {
    /// Derive fresh session state from a persisted todo.
    pub fn new(todo: Todo, timing: ReminderTiming) -> Self {
        let counter = SetCounter::new(todo.sets);
        let reconciler = CompletionReconciler::new(todo.completed);
        Self {
            todo,
            counter,
            rest_timer: RestTimer::new(),
            reminder: InactivityReminder::new(timing),
            reconciler,
        }
    }

    pub fn todo(&self) -> &Todo {
        &self.todo
    }

    pub fn todo_id(&self) -> i64 {
        self.todo.id
    }

    pub fn completed_sets(&self) -> u32 {
        self.counter.completed()
    }

    pub fn completed(&self) -> bool {
        self.reconciler.completed()
    }

    /// Count one set. Delegation order: counter, reminder, reconciler -
    /// the reminder sees the post-increment count, the reconciler sees
    /// both the new count and the already-settled reminder state.
    pub fn increment<S: TodoStore>(&mut self, store: &mut S) -> Result<Vec<Event>, DatabaseError> {
        self.increment_at(now_ms(), store)
    }

    pub fn increment_at<S: TodoStore>(
        &mut self,
        now_ms: u64,
        store: &mut S,
    ) -> Result<Vec<Event>, DatabaseError> {
        let mut events = Vec::new();
        let at = Utc::now();
        let todo_id = self.todo.id;

        if let Some(count) = self.counter.increment() {
            events.push(Event::SetCompleted {
                todo_id,
                completed_sets: count,
                goal: self.counter.goal(),
                at,
            });
            if !self.counter.goal_reached() {
                // Debounce: the newest set's schedule replaces the old one.
                self.reminder.rearm_at(now_ms);
                events.push(Event::ReminderArmed {
                    todo_id,
                    due_in_secs: self.reminder.timing().delay_ms / 1000,
                    at,
                });
            } else if self.reminder.cancel() {
                events.push(Event::ReminderCancelled { todo_id, at });
            }
        }

        if let Some(updated) = self.reconciler.observe(self.counter.completed(), &self.todo) {
            store.update(&updated)?;
            self.todo = updated;
            events.push(Event::TodoCompleted { todo_id, at });
        }

        Ok(events)
    }

    /// Manual override: zero the counter and reopen the entry, issuing
    /// exactly one incomplete write regardless of prior state.
    pub fn reset<S: TodoStore>(&mut self, store: &mut S) -> Result<Vec<Event>, DatabaseError> {
        let mut events = Vec::new();
        let at = Utc::now();
        let todo_id = self.todo.id;

        if self.reminder.cancel() {
            events.push(Event::ReminderCancelled { todo_id, at });
        }
        self.counter.reset();
        events.push(Event::CounterReset { todo_id, at });

        let updated = self.reconciler.reset(&self.todo);
        store.update(&updated)?;
        self.todo = updated;
        events.push(Event::TodoReopened { todo_id, at });

        Ok(events)
    }

    pub fn timer_start(&mut self) -> Option<Event> {
        self.timer_start_at(now_ms())
    }

    pub fn timer_start_at(&mut self, now_ms: u64) -> Option<Event> {
        self.rest_timer.start_at(now_ms).then(|| Event::TimerStarted {
            todo_id: self.todo.id,
            at: Utc::now(),
        })
    }

    pub fn timer_pause(&mut self) -> Option<Event> {
        self.timer_pause_at(now_ms())
    }

    pub fn timer_pause_at(&mut self, now_ms: u64) -> Option<Event> {
        self.rest_timer.pause_at(now_ms).then(|| Event::TimerPaused {
            todo_id: self.todo.id,
            elapsed_secs: self.rest_timer.elapsed_secs(),
            at: Utc::now(),
        })
    }

    pub fn timer_reset(&mut self) -> Event {
        self.rest_timer.reset();
        Event::TimerReset {
            todo_id: self.todo.id,
            at: Utc::now(),
        }
    }

    /// Advance the wall-clock state machines.
    pub fn tick(&mut self) -> Vec<Event> {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now_ms: u64) -> Vec<Event> {
        self.rest_timer.tick_at(now_ms);
        let at = Utc::now();
        let todo_id = self.todo.id;
        match self.reminder.tick_at(now_ms) {
            Some(ReminderTick::Fired) => vec![Event::ReminderFired { todo_id, at }],
            Some(ReminderTick::Dismissed) => vec![Event::ReminderDismissed { todo_id, at }],
            None => Vec::new(),
        }
    }

    /// Reinitialize from an externally changed todo, cancelling pending
    /// work first.
    pub fn sync_todo(&mut self, new_todo: Todo) {
        let timing = self.reminder.timing();
        self.teardown();
        *self = Self::new(new_todo, timing);
    }

    /// Cancel all outstanding scheduled work. Nothing fires afterwards.
    pub fn teardown(&mut self) {
        self.reminder.teardown();
        self.rest_timer.reset();
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::SessionSnapshot {
            todo_id: self.todo.id,
            completed_sets: self.counter.completed(),
            goal: self.counter.goal(),
            elapsed_secs: self.rest_timer.elapsed_secs(),
            timer_running: self.rest_timer.running(),
            reminder_visible: self.reminder.visible(),
            completed: self.reconciler.completed(),
            at: Utc::now(),
        }
    }
}

/// Owns the per-entry sessions and the todo store.
///
/// Ephemeral state lives here, in an explicit map keyed by todo id;
/// sessions are mounted on demand from the store and torn down on
/// unmount or delete.
pub struct SessionManager<S: TodoStore> {
    store: S,
    timing: ReminderTiming,
    sessions: HashMap<i64, WorkoutSession>,
}

impl<S: TodoStore> SessionManager<S> {
    pub fn new(store: S, timing: ReminderTiming) -> Self {
        Self {
            store,
            timing,
            sessions: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self, id: i64) -> Option<&WorkoutSession> {
        self.sessions.get(&id)
    }

    /// Mount a session for the entry, deriving fresh state from the
    /// store. No-op if already mounted.
    pub fn mount(&mut self, id: i64) -> Result<(), CoreError> {
        if self.sessions.contains_key(&id) {
            return Ok(());
        }
        let todo = self
            .store
            .get(id)?
            .ok_or(DatabaseError::NotFound { id })?;
        self.sessions
            .insert(id, WorkoutSession::new(todo, self.timing));
        Ok(())
    }

    /// Adopt previously saved session state, refreshing it against the
    /// store first. If the persisted todo changed since the session was
    /// saved, the session is reinitialized from the current record.
    pub fn adopt(&mut self, mut session: WorkoutSession) -> Result<(), CoreError> {
        let id = session.todo_id();
        let current = self
            .store
            .get(id)?
            .ok_or(DatabaseError::NotFound { id })?;
        if *session.todo() != current {
            session.sync_todo(current);
        }
        self.sessions.insert(id, session);
        Ok(())
    }

    /// Tear the session down and drop it. Pending work is cancelled.
    pub fn unmount(&mut self, id: i64) {
        if let Some(mut session) = self.sessions.remove(&id) {
            session.teardown();
        }
    }

    /// Delete the entry from the store, tearing down its session.
    pub fn delete(&mut self, id: i64) -> Result<(), CoreError> {
        self.unmount(id);
        self.store.delete(id)?;
        Ok(())
    }

    /// Re-read the entry from the store and reinitialize its session
    /// (external edit). Unmounts if the entry no longer exists.
    pub fn refresh(&mut self, id: i64) -> Result<(), CoreError> {
        match self.store.get(id)? {
            Some(todo) => {
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.sync_todo(todo);
                } else {
                    self.sessions.insert(id, WorkoutSession::new(todo, self.timing));
                }
                Ok(())
            }
            None => {
                self.unmount(id);
                Err(DatabaseError::NotFound { id }.into())
            }
        }
    }

    pub fn increment(&mut self, id: i64) -> Result<Vec<Event>, CoreError> {
        self.increment_at(id, now_ms())
    }

    pub fn increment_at(&mut self, id: i64, now_ms: u64) -> Result<Vec<Event>, CoreError> {
        self.mount(id)?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(DatabaseError::NotFound { id })?;
        Ok(session.increment_at(now_ms, &mut self.store)?)
    }

    pub fn reset(&mut self, id: i64) -> Result<Vec<Event>, CoreError> {
        self.mount(id)?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(DatabaseError::NotFound { id })?;
        Ok(session.reset(&mut self.store)?)
    }

    pub fn timer_start(&mut self, id: i64) -> Result<Option<Event>, CoreError> {
        self.timer_start_at(id, now_ms())
    }

    pub fn timer_start_at(&mut self, id: i64, now_ms: u64) -> Result<Option<Event>, CoreError> {
        self.mount(id)?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(DatabaseError::NotFound { id })?;
        Ok(session.timer_start_at(now_ms))
    }

    pub fn timer_pause(&mut self, id: i64) -> Result<Option<Event>, CoreError> {
        self.timer_pause_at(id, now_ms())
    }

    pub fn timer_pause_at(&mut self, id: i64, now_ms: u64) -> Result<Option<Event>, CoreError> {
        self.mount(id)?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(DatabaseError::NotFound { id })?;
        Ok(session.timer_pause_at(now_ms))
    }

    pub fn timer_reset(&mut self, id: i64) -> Result<Event, CoreError> {
        self.mount(id)?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(DatabaseError::NotFound { id })?;
        Ok(session.timer_reset())
    }

    pub fn tick(&mut self, id: i64) -> Result<Vec<Event>, CoreError> {
        self.tick_at(id, now_ms())
    }

    pub fn tick_at(&mut self, id: i64, now_ms: u64) -> Result<Vec<Event>, CoreError> {
        self.mount(id)?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(DatabaseError::NotFound { id })?;
        Ok(session.tick_at(now_ms))
    }

    /// Advance every mounted session's clocks.
    pub fn tick_all(&mut self) -> Vec<Event> {
        self.tick_all_at(now_ms())
    }

    pub fn tick_all_at(&mut self, now_ms: u64) -> Vec<Event> {
        self.sessions
            .values_mut()
            .flat_map(|session| session.tick_at(now_ms))
            .collect()
    }

    pub fn snapshot(&mut self, id: i64) -> Result<Event, CoreError> {
        self.mount(id)?;
        let session = self
            .sessions
            .get(&id)
            .ok_or(DatabaseError::NotFound { id })?;
        Ok(session.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use crate::todo::NewTodo;
    use chrono::NaiveDate;

    fn new_todo(title: &str, sets: u32) -> NewTodo {
        NewTodo {
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
            title: title.to_string(),
            description: String::new(),
            sets,
        }
    }

    fn manager_with(sets: u32) -> (SessionManager<Database>, i64) {
        let mut db = Database::open_memory().unwrap();
        let todo = db.create(new_todo("Bench Press", sets)).unwrap();
        let id = todo.id;
        (SessionManager::new(db, ReminderTiming::default()), id)
    }

    fn has<F: Fn(&Event) -> bool>(events: &[Event], pred: F) -> bool {
        events.iter().any(pred)
    }

    #[test]
    fn three_increments_complete_goal_of_three() {
        let (mut mgr, id) = manager_with(3);

        let e1 = mgr.increment_at(id, 0).unwrap();
        assert!(has(&e1, |e| matches!(e, Event::ReminderArmed { .. })));
        let e2 = mgr.increment_at(id, 10_000).unwrap();
        assert!(has(&e2, |e| matches!(e, Event::ReminderArmed { .. })));

        let e3 = mgr.increment_at(id, 20_000).unwrap();
        assert!(has(&e3, |e| matches!(e, Event::TodoCompleted { .. })));
        // The pending reminder is cancelled at the goal, never fires.
        assert!(has(&e3, |e| matches!(e, Event::ReminderCancelled { .. })));
        assert!(mgr.tick_at(id, 120_000).unwrap().is_empty());

        let stored = mgr.store().get(id).unwrap().unwrap();
        assert!(stored.completed);
        assert_eq!(mgr.session(id).unwrap().completed_sets(), 3);
    }

    #[test]
    fn completion_write_fires_exactly_once() {
        let (mut mgr, id) = manager_with(2);

        mgr.increment_at(id, 0).unwrap();
        let edge = mgr.increment_at(id, 1_000).unwrap();
        assert!(has(&edge, |e| matches!(e, Event::TodoCompleted { .. })));

        // Attempts past the goal are no-ops: no count change, no write.
        for i in 0..5 {
            let events = mgr.increment_at(id, 2_000 + i).unwrap();
            assert!(events.is_empty());
        }
        assert_eq!(mgr.session(id).unwrap().completed_sets(), 2);
    }

    #[test]
    fn reminder_fires_between_spaced_increments() {
        let (mut mgr, id) = manager_with(2);

        // goal=2, increments 40s apart: the first arms a reminder that
        // fires at +30s and auto-hides at +35s.
        mgr.increment_at(id, 0).unwrap();
        assert!(mgr.tick_at(id, 29_000).unwrap().is_empty());

        let fired = mgr.tick_at(id, 30_000).unwrap();
        assert!(has(&fired, |e| matches!(e, Event::ReminderFired { .. })));
        match mgr.snapshot(id).unwrap() {
            Event::SessionSnapshot {
                reminder_visible, ..
            } => assert!(reminder_visible),
            other => panic!("expected snapshot, got {other:?}"),
        }

        let hidden = mgr.tick_at(id, 35_000).unwrap();
        assert!(has(&hidden, |e| matches!(e, Event::ReminderDismissed { .. })));

        // The second increment reaches the goal with nothing pending.
        let done = mgr.increment_at(id, 40_000).unwrap();
        assert!(has(&done, |e| matches!(e, Event::TodoCompleted { .. })));
        assert!(!has(&done, |e| matches!(e, Event::ReminderCancelled { .. })));
    }

    #[test]
    fn reset_mid_session_reopens_and_cancels() {
        let (mut mgr, id) = manager_with(3);

        mgr.increment_at(id, 0).unwrap();
        let events = mgr.reset(id).unwrap();

        assert!(has(&events, |e| matches!(e, Event::ReminderCancelled { .. })));
        assert!(has(&events, |e| matches!(e, Event::CounterReset { .. })));
        assert!(has(&events, |e| matches!(e, Event::TodoReopened { .. })));

        assert_eq!(mgr.session(id).unwrap().completed_sets(), 0);
        assert!(!mgr.store().get(id).unwrap().unwrap().completed);
        // The cancelled reminder never fires.
        assert!(mgr.tick_at(id, 120_000).unwrap().is_empty());
    }

    #[test]
    fn reset_when_already_incomplete_still_writes_once() {
        let (mut mgr, id) = manager_with(3);
        let events = mgr.reset(id).unwrap();
        assert!(has(&events, |e| matches!(e, Event::TodoReopened { .. })));
        assert!(!mgr.store().get(id).unwrap().unwrap().completed);
    }

    #[test]
    fn reset_after_completion_reenables_the_edge() {
        let (mut mgr, id) = manager_with(1);

        let first = mgr.increment_at(id, 0).unwrap();
        assert!(has(&first, |e| matches!(e, Event::TodoCompleted { .. })));

        mgr.reset(id).unwrap();
        assert!(!mgr.store().get(id).unwrap().unwrap().completed);

        let second = mgr.increment_at(id, 1_000).unwrap();
        assert!(has(&second, |e| matches!(e, Event::TodoCompleted { .. })));
        assert!(mgr.store().get(id).unwrap().unwrap().completed);
    }

    #[test]
    fn no_rearm_after_goal() {
        let (mut mgr, id) = manager_with(1);
        mgr.increment_at(id, 0).unwrap();

        // Further attempts are no-ops and must not arm anything.
        for i in 1..10u64 {
            let events = mgr.increment_at(id, i * 1_000).unwrap();
            assert!(!has(&events, |e| matches!(e, Event::ReminderArmed { .. })));
        }
        assert!(mgr.tick_at(id, 600_000).unwrap().is_empty());
    }

    #[test]
    fn timer_is_independent_of_counter() {
        let (mut mgr, id) = manager_with(3);

        mgr.timer_start_at(id, 0).unwrap();
        mgr.increment_at(id, 1_000).unwrap();
        mgr.tick_at(id, 5_000).unwrap();

        // Counter activity did not disturb the stopwatch, and pausing the
        // stopwatch does not touch the counter.
        mgr.timer_pause_at(id, 10_000).unwrap();
        assert_eq!(mgr.session(id).unwrap().completed_sets(), 1);
        match mgr.snapshot(id).unwrap() {
            Event::SessionSnapshot {
                elapsed_secs,
                timer_running,
                completed_sets,
                ..
            } => {
                assert_eq!(elapsed_secs, 10);
                assert!(!timer_running);
                assert_eq!(completed_sets, 1);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn double_timer_start_returns_no_second_event() {
        let (mut mgr, id) = manager_with(3);
        assert!(mgr.timer_start_at(id, 0).unwrap().is_some());
        assert!(mgr.timer_start_at(id, 2_000).unwrap().is_none());
        mgr.tick_at(id, 3_000).unwrap();
        match mgr.snapshot(id).unwrap() {
            Event::SessionSnapshot { elapsed_secs, .. } => assert_eq!(elapsed_secs, 3),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn unmount_cancels_pending_work() {
        let (mut mgr, id) = manager_with(3);
        mgr.increment_at(id, 0).unwrap();
        mgr.unmount(id);
        assert!(mgr.session(id).is_none());

        // Remounting derives fresh state; the old schedule is gone.
        assert!(mgr.tick_at(id, 60_000).unwrap().is_empty());
        assert_eq!(mgr.session(id).unwrap().completed_sets(), 0);
    }

    #[test]
    fn delete_tears_down_and_removes() {
        let (mut mgr, id) = manager_with(3);
        mgr.increment_at(id, 0).unwrap();
        mgr.delete(id).unwrap();
        assert!(mgr.session(id).is_none());
        assert!(mgr.store().get(id).unwrap().is_none());
        assert!(matches!(
            mgr.increment(id),
            Err(CoreError::Database(DatabaseError::NotFound { .. }))
        ));
    }

    #[test]
    fn refresh_reinitializes_from_external_edit() {
        let (mut mgr, id) = manager_with(3);
        mgr.increment_at(id, 0).unwrap();
        mgr.timer_start_at(id, 0).unwrap();

        // External edit: goal raised to 5.
        let mut edited = mgr.store().get(id).unwrap().unwrap();
        edited.sets = 5;
        mgr.store.update(&edited).unwrap();

        mgr.refresh(id).unwrap();
        let session = mgr.session(id).unwrap();
        assert_eq!(session.completed_sets(), 0);
        assert_eq!(session.todo().sets, 5);
        match session.snapshot() {
            Event::SessionSnapshot { timer_running, .. } => assert!(!timer_running),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn adopt_keeps_state_when_todo_unchanged() {
        let (mut mgr, id) = manager_with(3);
        mgr.increment_at(id, 0).unwrap();
        let saved = mgr.session(id).unwrap().clone();
        mgr.unmount(id);

        mgr.adopt(saved).unwrap();
        assert_eq!(mgr.session(id).unwrap().completed_sets(), 1);
    }

    #[test]
    fn adopt_reinitializes_when_todo_changed() {
        let (mut mgr, id) = manager_with(3);
        mgr.increment_at(id, 0).unwrap();
        let saved = mgr.session(id).unwrap().clone();
        mgr.unmount(id);

        let mut edited = mgr.store().get(id).unwrap().unwrap();
        edited.title = "Incline Press".to_string();
        mgr.store.update(&edited).unwrap();

        mgr.adopt(saved).unwrap();
        let session = mgr.session(id).unwrap();
        assert_eq!(session.completed_sets(), 0);
        assert_eq!(session.todo().title, "Incline Press");
    }

    #[test]
    fn session_state_roundtrips_through_json() {
        let (mut mgr, id) = manager_with(3);
        mgr.increment_at(id, 0).unwrap();
        mgr.timer_start_at(id, 0).unwrap();

        let json = serde_json::to_string(mgr.session(id).unwrap()).unwrap();
        let restored: WorkoutSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.completed_sets(), 1);
        assert_eq!(restored.todo_id(), id);
    }

    #[test]
    fn zero_goal_completes_on_first_attempt() {
        let (mut mgr, id) = manager_with(0);
        let events = mgr.increment_at(id, 0).unwrap();
        // The increment itself is a no-op, but the reconciler observes
        // count 0 >= goal 0 and issues the single completion write.
        assert!(!has(&events, |e| matches!(e, Event::SetCompleted { .. })));
        assert!(has(&events, |e| matches!(e, Event::TodoCompleted { .. })));
        assert!(mgr.increment_at(id, 1_000).unwrap().is_empty());
    }
}
