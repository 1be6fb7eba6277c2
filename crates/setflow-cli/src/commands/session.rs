//! Per-entry session commands for CLI.
//!
//! Session state is parked in the kv table between invocations and
//! adopted back on the next command, so the counter, stopwatch, and
//! reminder schedule survive process exits. Stale or corrupt parked
//! state is discarded and re-derived from the todo record.

use clap::Subcommand;
use setflow_core::session::{SessionManager, WorkoutSession};
use setflow_core::storage::{Config, Database};
use setflow_core::Event;

fn session_key(id: i64) -> String {
    format!("session:{id}")
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Count one completed set
    Increment {
        /// Todo id
        id: i64,
    },
    /// Zero the counter and reopen the entry
    Reset {
        /// Todo id
        id: i64,
    },
    /// Start the rest stopwatch
    TimerStart {
        /// Todo id
        id: i64,
    },
    /// Pause the rest stopwatch
    TimerPause {
        /// Todo id
        id: i64,
    },
    /// Zero the rest stopwatch
    TimerReset {
        /// Todo id
        id: i64,
    },
    /// Advance the clocks, reporting fired or dismissed reminders
    Tick {
        /// Todo id
        id: i64,
    },
    /// Print current session state as JSON
    Status {
        /// Todo id
        id: i64,
    },
}

fn restore(mgr: &mut SessionManager<Database>, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(json) = mgr.store().kv_get(&session_key(id))? {
        if let Ok(parked) = serde_json::from_str::<WorkoutSession>(&json) {
            // adopt() refreshes against the store; a session whose todo
            // was edited in the meantime is reinitialized. A missing
            // todo is reported by the command itself.
            let _ = mgr.adopt(parked);
        }
    }
    Ok(())
}

fn park(mgr: &SessionManager<Database>, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(session) = mgr.session(id) {
        let json = serde_json::to_string(session)?;
        mgr.store().kv_set(&session_key(id), &json)?;
    }
    Ok(())
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let mut mgr = SessionManager::new(db, config.reminder_timing());

    let id = match &action {
        SessionAction::Increment { id }
        | SessionAction::Reset { id }
        | SessionAction::TimerStart { id }
        | SessionAction::TimerPause { id }
        | SessionAction::TimerReset { id }
        | SessionAction::Tick { id }
        | SessionAction::Status { id } => *id,
    };
    restore(&mut mgr, id)?;

    let events = match action {
        SessionAction::Increment { id } => mgr.increment(id)?,
        SessionAction::Reset { id } => mgr.reset(id)?,
        SessionAction::TimerStart { id } => mgr.timer_start(id)?.into_iter().collect(),
        SessionAction::TimerPause { id } => mgr.timer_pause(id)?.into_iter().collect(),
        SessionAction::TimerReset { id } => vec![mgr.timer_reset(id)?],
        SessionAction::Tick { id } => mgr.tick(id)?,
        SessionAction::Status { id } => vec![mgr.snapshot(id)?],
    };

    if events.is_empty() {
        // Nothing changed (e.g. increment past goal); show where we are.
        println!("{}", serde_json::to_string_pretty(&mgr.snapshot(id)?)?);
    }
    for event in &events {
        println!("{}", serde_json::to_string_pretty(event)?);
        if matches!(event, Event::ReminderFired { .. }) && config.notifications.enabled {
            eprintln!("{}", config.notifications.message);
        }
    }

    park(&mgr, id)?;
    Ok(())
}
