//! Error types for task operations

use thiserror::Error;

/// Task error types.
#[derive(Debug, Error)]
pub enum TaskError {
    /// No task with the given ID
    #[error("Task not found")]
    NotFound,

    /// The task belongs to another user
    #[error("Unauthorized")]
    Forbidden,

    /// Missing or malformed input
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Storage failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for task operations.
pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            TaskError::NotFound => 404,
            TaskError::Forbidden => 403,
            TaskError::ValidationFailed(_) => 400,
            TaskError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            TaskError::NotFound => "TASK_NOT_FOUND",
            TaskError::Forbidden => "FORBIDDEN",
            TaskError::ValidationFailed(_) => "VALIDATION_FAILED",
            TaskError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
