//! Request authentication.
//!
//! [`require_auth`] guards protected routes. A bearer token wins when an
//! `Authorization` header is present; otherwise the cookie session is
//! consulted, when the session layer is installed. On success the handler
//! sees a [`CurrentUser`] extension; on any failure it never runs.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use std::convert::Infallible;
use taskflow_auth::{AuthError, User};
use tower_sessions::Session;
use tracing::debug;
use uuid::Uuid;

/// Session key holding the signed-in user's ID.
pub const SESSION_USER_KEY: &str = "user_id";

/// The authenticated caller, loaded fresh from the credential store.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub user: User,
}

/// The request's cookie session, if the session layer is installed.
pub struct MaybeSession(pub Option<Session>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Session>().cloned()))
    }
}

impl MaybeSession {
    /// Bind the session to `user_id`, rotating its ID first.
    pub async fn sign_in(&self, user_id: Uuid) -> Result<(), ApiError> {
        if let Some(session) = &self.0 {
            session.cycle_id().await?;
            session.insert(SESSION_USER_KEY, user_id).await?;
        }
        Ok(())
    }

    /// Destroy the session.
    pub async fn sign_out(&self) -> Result<(), ApiError> {
        if let Some(session) = &self.0 {
            session.flush().await?;
        }
        Ok(())
    }
}

/// Reject the request with 401 unless it carries a valid credential.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Some(None) means a header that is not a usable bearer credential.
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().ok().and_then(bearer_token).map(str::to_owned));

    let user = match bearer {
        Some(Some(token)) => state.auth.authenticate(&token).await.map_err(reject)?,
        Some(None) => return Err(ApiError::unauthorized("Not authorized, no token")),
        None => {
            let session = request.extensions().get::<Session>().cloned();
            let user_id = match session {
                Some(session) => session.get::<Uuid>(SESSION_USER_KEY).await?,
                None => None,
            };
            let user_id =
                user_id.ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;
            state.auth.current_user(user_id).await.map_err(reject)?
        }
    };

    request.extensions_mut().insert(CurrentUser { id: user.id, user });
    Ok(next.run(request).await)
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn reject(e: AuthError) -> ApiError {
    debug!(error = %e, "Rejected request credentials");
    ApiError::from(e)
}
