//! Task persistence
//!
//! [`TaskRepository`] is the storage seam; [`MemoryTaskRepository`] keeps
//! tasks in process behind a `tokio` read-write lock.

use crate::error::{TaskError, TaskResult};
use crate::task::Task;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Storage for tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Store a new task.
    async fn insert(&self, task: Task) -> TaskResult<Task>;

    /// Look up a task by ID.
    async fn get(&self, id: Uuid) -> TaskResult<Option<Task>>;

    /// All tasks owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> TaskResult<Vec<Task>>;

    /// Replace a stored task. Fails with [`TaskError::NotFound`] if absent.
    async fn update(&self, task: Task) -> TaskResult<Task>;

    /// Remove a task. Fails with [`TaskError::NotFound`] if absent.
    async fn delete(&self, id: Uuid) -> TaskResult<()>;
}

/// In-memory task repository.
#[derive(Debug, Default)]
pub struct MemoryTaskRepository {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn insert(&self, task: Task) -> TaskResult<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(TaskError::Internal(format!("duplicate task id {}", task.id)));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get(&self, id: Uuid) -> TaskResult<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> TaskResult<Vec<Task>> {
        let mut owned: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.is_owned_by(user_id))
            .cloned()
            .collect();
        // v7 IDs are time-ordered, so they break created_at ties.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn update(&self, task: Task) -> TaskResult<Task> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(task)
            }
            None => Err(TaskError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> TaskResult<()> {
        self.tasks
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(TaskError::NotFound)
    }
}
