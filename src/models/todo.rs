use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Maximum task length in characters, counted after trimming.
pub const MAX_TASK_LENGTH: usize = 500;

/// A todo item as stored in the `todos` table and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Todo {
    pub id: i64,
    pub task: String,
    /// Completion flag; `false` on creation.
    pub status: bool,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /todos`. The task goes through [`normalize_task`].
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub task: String,
}

/// Body of `PUT /todos/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub task: Option<String>,
    pub status: Option<bool>,
}

/// Trims `task`, then requires 1 to [`MAX_TASK_LENGTH`] characters.
pub fn normalize_task(task: &str) -> Result<String, AppError> {
    let trimmed = task.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Task cannot be empty".into()));
    }
    if trimmed.chars().count() > MAX_TASK_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Task must be at most {} characters",
            MAX_TASK_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}
