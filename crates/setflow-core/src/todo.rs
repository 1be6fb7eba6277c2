//! The persisted todo model.
//!
//! A todo is one exercise entry: a calendar date, a title, a description,
//! a sets goal, and a completion flag. Ids are assigned by the store.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A workout entry as persisted in the todo store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier, assigned by the store
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Scheduled date of the exercise
    pub date: NaiveDate,
    /// Exercise name (e.g. "Bench Press")
    pub title: String,
    /// Free-form notes (working muscles, form cues)
    pub description: String,
    /// Sets goal. Upstream data sometimes carries this as a numeric
    /// string, so deserialization coerces; comparisons are always numeric.
    #[serde(deserialize_with = "sets_from_number_or_string")]
    pub sets: u32,
    /// Whether the goal has been reached
    pub completed: bool,
}

/// Payload for creating a todo (id not yet assigned).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTodo {
    pub user_id: i64,
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "sets_from_number_or_string")]
    pub sets: u32,
}

impl NewTodo {
    /// Attach a store-assigned id, producing an incomplete todo.
    pub fn into_todo(self, id: i64) -> Todo {
        Todo {
            id,
            user_id: self.user_id,
            date: self.date,
            title: self.title,
            description: self.description,
            sets: self.sets,
            completed: false,
        }
    }
}

fn sets_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Todo {
        Todo {
            id: 1,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
            title: "Bench Press".to_string(),
            description: "Working Muscles: Chest, Triceps, Deltoids".to_string(),
            sets: 4,
            completed: false,
        }
    }

    #[test]
    fn todo_serialization_roundtrip() {
        let todo = sample();
        let json = serde_json::to_string(&todo).unwrap();
        let decoded: Todo = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, todo);
    }

    #[test]
    fn sets_accepts_numeric_string() {
        let json = r#"{
            "id": 7,
            "user_id": 1,
            "date": "2024-03-18",
            "title": "Squat",
            "description": "",
            "sets": "5",
            "completed": false
        }"#;
        let decoded: Todo = serde_json::from_str(json).unwrap();
        assert_eq!(decoded.sets, 5);
    }

    #[test]
    fn sets_rejects_non_numeric_string() {
        let json = r#"{
            "id": 7,
            "user_id": 1,
            "date": "2024-03-18",
            "title": "Squat",
            "description": "",
            "sets": "lots",
            "completed": false
        }"#;
        assert!(serde_json::from_str::<Todo>(json).is_err());
    }

    #[test]
    fn new_todo_into_todo_starts_incomplete() {
        let new = NewTodo {
            user_id: 2,
            date: NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
            title: "Deadlift".to_string(),
            description: String::new(),
            sets: 3,
        };
        let todo = new.into_todo(42);
        assert_eq!(todo.id, 42);
        assert_eq!(todo.user_id, 2);
        assert!(!todo.completed);
    }
}
