//! Task CRUD for the authenticated caller.

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::Extension;
use taskflow_tasks::{NewTask, Task, TaskError, TaskUpdate};
use uuid::Uuid;

/// GET /api/tasks
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.tasks.list(current.id).await?))
}

/// POST /api/tasks
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(input) = body?;
    let task = state.tasks.create(current.id, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/tasks/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<TaskUpdate>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = task_id(id)?;
    let Json(update) = body?;
    Ok(Json(state.tasks.update(current.id, id, update).await?))
}

/// DELETE /api/tasks/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = task_id(id)?;
    state.tasks.delete(current.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// A malformed ID cannot name an existing task.
fn task_id(id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::from(TaskError::NotFound))
}
