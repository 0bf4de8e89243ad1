//! Ownership-checked task operations.

use crate::error::{TaskError, TaskResult};
use crate::repository::TaskRepository;
use crate::task::{NewTask, Task, TaskUpdate};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// CRUD over tasks on behalf of an authenticated user.
///
/// Every operation takes the caller's user ID. Reading or changing a task
/// owned by someone else fails with [`TaskError::Forbidden`]; a missing task
/// fails with [`TaskError::NotFound`].
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    /// Create a task owned by `user_id`.
    pub async fn create(&self, user_id: Uuid, input: NewTask) -> TaskResult<Task> {
        let task = Task::new(user_id, input.title, input.description)?;
        let task = self.repo.insert(task).await?;
        debug!(user_id = %user_id, task_id = %task.id, "Task created");
        Ok(task)
    }

    /// The caller's tasks, newest first.
    pub async fn list(&self, user_id: Uuid) -> TaskResult<Vec<Task>> {
        self.repo.list_for_user(user_id).await
    }

    /// Apply `update` to a task the caller owns. An empty update leaves the
    /// task, including `updated_at`, untouched.
    pub async fn update(&self, user_id: Uuid, task_id: Uuid, update: TaskUpdate) -> TaskResult<Task> {
        let mut task = self.owned(user_id, task_id).await?;
        if update.is_empty() {
            return Ok(task);
        }
        task.apply(update)?;
        let task = self.repo.update(task).await?;
        debug!(user_id = %user_id, task_id = %task_id, "Task updated");
        Ok(task)
    }

    /// Delete a task the caller owns.
    pub async fn delete(&self, user_id: Uuid, task_id: Uuid) -> TaskResult<()> {
        self.owned(user_id, task_id).await?;
        self.repo.delete(task_id).await?;
        debug!(user_id = %user_id, task_id = %task_id, "Task deleted");
        Ok(())
    }

    async fn owned(&self, user_id: Uuid, task_id: Uuid) -> TaskResult<Task> {
        let task = self.repo.get(task_id).await?.ok_or(TaskError::NotFound)?;
        if !task.is_owned_by(user_id) {
            warn!(user_id = %user_id, task_id = %task_id, "Rejected access to another user's task");
            return Err(TaskError::Forbidden);
        }
        Ok(task)
    }
}
