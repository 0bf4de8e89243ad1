//! # Taskflow Tasks
//!
//! User-owned to-do items: the [`Task`] model, the [`TaskRepository`]
//! storage seam with an in-memory implementation, and the
//! ownership-checked [`TaskService`] the HTTP layer calls.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskflow_tasks::{MemoryTaskRepository, NewTask, TaskService};
//! use uuid::Uuid;
//!
//! # async fn run() -> taskflow_tasks::TaskResult<()> {
//! let service = TaskService::new(Arc::new(MemoryTaskRepository::new()));
//! let owner = Uuid::now_v7();
//!
//! let task = service
//!     .create(owner, NewTask { title: "Buy milk".into(), description: None })
//!     .await?;
//! assert_eq!(service.list(owner).await?, vec![task]);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod repository;
pub mod service;
pub mod task;

pub use error::{TaskError, TaskResult};
pub use repository::{MemoryTaskRepository, TaskRepository};
pub use service::TaskService;
pub use task::{NewTask, Task, TaskUpdate};
