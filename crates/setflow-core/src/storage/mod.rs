mod config;
pub mod database;

pub use config::Config;
pub use database::Database;

use std::path::PathBuf;

use crate::error::DatabaseError;
use crate::todo::{NewTodo, Todo};

/// The persistence seam consumed by the session layer.
///
/// Updates are keyed by `todo.id`, last-write-wins, and idempotent for
/// identical payloads. Callers tear down any in-flight session for a
/// deleted id.
pub trait TodoStore {
    fn create(&mut self, new: NewTodo) -> Result<Todo, DatabaseError>;
    fn list(&self) -> Result<Vec<Todo>, DatabaseError>;
    fn get(&self, id: i64) -> Result<Option<Todo>, DatabaseError>;
    fn update(&mut self, todo: &Todo) -> Result<(), DatabaseError>;
    fn delete(&mut self, id: i64) -> Result<(), DatabaseError>;
}

/// Returns `~/.config/setflow[-dev]/` based on SETFLOW_ENV.
///
/// Set SETFLOW_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SETFLOW_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("setflow-dev")
    } else {
        base_dir.join("setflow")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
