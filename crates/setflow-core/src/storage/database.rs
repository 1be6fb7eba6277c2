//! SQLite-based todo storage.
//!
//! Provides persistent storage for:
//! - The workout todo list
//! - A key-value store for application state (parked session state)

use std::path::Path;

use chrono::NaiveDate;
use indoc::indoc;
use rusqlite::{params, Connection, Row};

use super::{data_dir, TodoStore};
use crate::error::DatabaseError;
use crate::todo::{NewTodo, Todo};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite database holding the todo list and the kv store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/setflow/setflow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("setflow.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the database at an explicit path, creating the schema if
    /// needed.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(indoc! {"
                CREATE TABLE IF NOT EXISTS todos (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id     INTEGER NOT NULL,
                    date        TEXT NOT NULL,
                    title       TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    sets        INTEGER NOT NULL,
                    completed   INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_todos_date ON todos(date);
                CREATE INDEX IF NOT EXISTS idx_todos_user_id ON todos(user_id);
            "})
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    fn row_to_todo(row: &Row<'_>) -> rusqlite::Result<Todo> {
        let date_str: String = row.get(2)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Todo {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date,
            title: row.get(3)?,
            description: row.get(4)?,
            sets: row.get(5)?,
            completed: row.get(6)?,
        })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl TodoStore for Database {
    fn create(&mut self, new: NewTodo) -> Result<Todo, DatabaseError> {
        self.conn.execute(
            "INSERT INTO todos (user_id, date, title, description, sets, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![
                new.user_id,
                new.date.format(DATE_FORMAT).to_string(),
                new.title,
                new.description,
                new.sets,
            ],
        )?;
        Ok(new.into_todo(self.conn.last_insert_rowid()))
    }

    fn list(&self) -> Result<Vec<Todo>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, date, title, description, sets, completed
             FROM todos ORDER BY date, id",
        )?;
        let rows = stmt.query_map([], Self::row_to_todo)?;
        let mut todos = Vec::new();
        for row in rows {
            todos.push(row?);
        }
        Ok(todos)
    }

    fn get(&self, id: i64) -> Result<Option<Todo>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, date, title, description, sets, completed
             FROM todos WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id], Self::row_to_todo);
        match result {
            Ok(todo) => Ok(Some(todo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn update(&mut self, todo: &Todo) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE todos
             SET user_id = ?2, date = ?3, title = ?4, description = ?5,
                 sets = ?6, completed = ?7
             WHERE id = ?1",
            params![
                todo.id,
                todo.user_id,
                todo.date.format(DATE_FORMAT).to_string(),
                todo.title,
                todo.description,
                todo.sets,
                todo.completed,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound { id: todo.id });
        }
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<(), DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DatabaseError::NotFound { id });
        }
        Ok(())
    }
}
