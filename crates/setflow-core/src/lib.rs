//! # Setflow Core Library
//!
//! This library provides the core business logic for the Setflow workout
//! tracker. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any GUI being a thin layer
//! over the same core library.
//!
//! ## Architecture
//!
//! - **Session Tracker**: Per-entry set counting, rest stopwatch, and
//!   inactivity reminders -- wall-clock-based state machines that require
//!   the caller to periodically invoke `tick()` for progress updates
//! - **Storage**: SQLite-based todo storage and TOML-based configuration
//! - **Events**: Every state change produces a serializable [`Event`]
//!
//! ## Key Components
//!
//! - [`SessionManager`]: Owns the per-entry sessions and the todo store
//! - [`WorkoutSession`]: Session state machine for one entry
//! - [`Database`]: Todo persistence and key-value store
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod todo;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use session::{SessionManager, WorkoutSession};
pub use storage::{Config, Database, TodoStore};
pub use todo::{NewTodo, Todo};
