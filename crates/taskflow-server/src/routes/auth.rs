//! Local account endpoints.

use super::found;
use crate::error::ApiError;
use crate::middleware::MaybeSession;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Json, Response};
use serde::Deserialize;
use taskflow_auth::AuthSession;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    session: MaybeSession,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let Json(body) = body?;
    let auth = state
        .auth
        .register(&body.name, &body.email, &body.password)
        .await?;
    session.sign_in(auth.user.id).await?;
    Ok((StatusCode::CREATED, Json(auth)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    session: MaybeSession,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let Json(body) = body?;
    let auth = state.auth.login(&body.email, &body.password).await?;
    session.sign_in(auth.user.id).await?;
    Ok(Json(auth))
}

/// GET /api/auth/failure
pub async fn failure(State(state): State<AppState>) -> Response {
    found(&state.auth.failure_redirect())
}
