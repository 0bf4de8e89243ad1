//! Task domain models
//!
//! A [`Task`] is owned by exactly one user. [`NewTask`] and [`TaskUpdate`]
//! are the request payloads for creating and editing one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};

/// A to-do item belonging to a single user.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use taskflow_tasks::Task;
///
/// let owner = Uuid::now_v7();
/// let task = Task::new(owner, "Buy milk", None).unwrap();
/// assert_eq!(task.title, "Buy milk");
/// assert!(!task.completed);
/// assert!(task.is_owned_by(owner));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task
    pub id: Uuid,

    /// Owner of the task
    pub user_id: Uuid,

    /// Short summary, never blank
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Whether the task is done
    pub completed: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates an open task for `user_id`.
    ///
    /// Fails with [`TaskError::ValidationFailed`] when the title is blank.
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
    ) -> TaskResult<Self> {
        let title = clean_title(title.into())?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            user_id,
            title,
            description: clean_description(description),
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checks whether `user_id` owns this task.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Applies a partial update. Fields left as `None` are unchanged.
    pub fn apply(&mut self, update: TaskUpdate) -> TaskResult<()> {
        if let Some(title) = update.title {
            self.title = clean_title(title)?;
        }
        if let Some(description) = update.description {
            self.description = clean_description(Some(description));
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Payload for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

fn clean_title(title: String) -> TaskResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::ValidationFailed(
            "Please provide a title".to_string(),
        ));
    }
    Ok(title.to_string())
}

// An empty description is stored as none.
fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
