//! Todo management commands for CLI.

use std::io::{BufRead, Write};

use chrono::NaiveDate;
use clap::Subcommand;
use setflow_core::storage::{Config, Database, TodoStore};
use setflow_core::todo::{NewTodo, Todo};

#[derive(Subcommand)]
pub enum TodoAction {
    /// Create a new todo
    Add {
        /// Exercise name (e.g. "Bench Press")
        title: String,
        /// Scheduled date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Free-form notes (working muscles, form cues)
        #[arg(long, default_value = "")]
        description: String,
        /// Sets goal
        #[arg(long)]
        sets: u32,
        /// Owning user id (defaults to todos.default_user_id)
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// List todos
    List {
        /// Print raw JSON instead of the one-line summary
        #[arg(long)]
        json: bool,
    },
    /// Show one todo as JSON
    Show {
        /// Todo id
        id: i64,
    },
    /// Edit fields of a todo
    Edit {
        /// Todo id
        id: i64,
        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New sets goal
        #[arg(long)]
        sets: Option<u32>,
        /// Set the completion flag directly
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Delete a todo
    Rm {
        /// Todo id
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Date display used by the human-readable listing, e.g. "Mar 18 2024".
fn format_date(date: NaiveDate) -> String {
    date.format("%b %d %Y").to_string()
}

fn summary_line(todo: &Todo) -> String {
    let mark = if todo.completed { "x" } else { " " };
    format!(
        "[{}] {:>4}  {}  {} - {} sets",
        mark,
        todo.id,
        format_date(todo.date),
        todo.title,
        todo.sets
    )
}

fn confirm_delete(todo: &Todo) -> Result<bool, Box<dyn std::error::Error>> {
    print!("Delete '{}'? [y/N] ", todo.title);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

pub fn run(action: TodoAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;

    match action {
        TodoAction::Add {
            title,
            date,
            description,
            sets,
            user_id,
        } => {
            let config = Config::load_or_default();
            let todo = db.create(NewTodo {
                user_id: user_id.unwrap_or(config.todos.default_user_id),
                date,
                title,
                description,
                sets,
            })?;
            println!("Todo created: {}", todo.id);
            println!("{}", serde_json::to_string_pretty(&todo)?);
        }
        TodoAction::List { json } => {
            let todos = db.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&todos)?);
            } else {
                for todo in &todos {
                    println!("{}", summary_line(todo));
                }
            }
        }
        TodoAction::Show { id } => match db.get(id)? {
            Some(todo) => println!("{}", serde_json::to_string_pretty(&todo)?),
            None => {
                eprintln!("Todo not found: {id}");
                std::process::exit(1);
            }
        },
        TodoAction::Edit {
            id,
            date,
            title,
            description,
            sets,
            completed,
        } => {
            let Some(mut todo) = db.get(id)? else {
                eprintln!("Todo not found: {id}");
                std::process::exit(1);
            };
            if let Some(date) = date {
                todo.date = date;
            }
            if let Some(title) = title {
                todo.title = title;
            }
            if let Some(description) = description {
                todo.description = description;
            }
            if let Some(sets) = sets {
                todo.sets = sets;
            }
            if let Some(completed) = completed {
                todo.completed = completed;
            }
            db.update(&todo)?;
            println!("{}", serde_json::to_string_pretty(&todo)?);
        }
        TodoAction::Rm { id, yes } => {
            let Some(todo) = db.get(id)? else {
                eprintln!("Todo not found: {id}");
                std::process::exit(1);
            };
            if !yes && !confirm_delete(&todo)? {
                println!("aborted");
                return Ok(());
            }
            db.delete(id)?;
            // Any parked session for the entry goes with it.
            db.kv_delete(&format!("session:{id}"))?;
            println!("Todo deleted: {id}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_date_matches_card_header_style() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_date(date), "Jan 05 2026");
    }

    #[test]
    fn summary_line_marks_completion() {
        let todo = Todo {
            id: 3,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
            title: "Squat".to_string(),
            description: String::new(),
            sets: 5,
            completed: true,
        };
        let line = summary_line(&todo);
        assert!(line.starts_with("[x]"));
        assert!(line.contains("Mar 18 2024"));
        assert!(line.contains("Squat - 5 sets"));
    }
}
