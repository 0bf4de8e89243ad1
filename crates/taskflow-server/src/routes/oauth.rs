//! OAuth sign-in and the session endpoints that sit beside it.
//!
//! `begin` hands the browser a nonce in a short-lived cookie scoped to these
//! routes; the signed `state` only verifies on a callback that presents the
//! same cookie, and the cookie is cleared once the callback has run.

use super::found;
use crate::error::ApiError;
use crate::middleware::{CurrentUser, MaybeSession};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use taskflow_auth::jwt::OAUTH_STATE_LIFETIME_MINUTES;
use taskflow_auth::{OAuthCallback, OAuthProvider};
use tracing::{error, info, warn};

/// Cookie carrying the browser nonce of a pending OAuth sign-in.
pub const OAUTH_NONCE_COOKIE: &str = "taskflow.oauth";

const OAUTH_COOKIE_PATH: &str = "/api/auth/oauth";

/// GET /api/auth/oauth/{provider}
pub async fn begin(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(provider): Path<String>,
) -> Result<Response, ApiError> {
    let provider = OAuthProvider::parse(&provider)
        .ok_or_else(|| ApiError::not_found(format!("Unknown provider '{}'", provider)))?;

    match state.auth.begin_oauth(provider) {
        Ok(start) => {
            // Lax: sent along on the provider's top-level redirect back.
            let cookie = Cookie::build((OAUTH_NONCE_COOKIE, start.nonce))
                .path(OAUTH_COOKIE_PATH)
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.secure_cookies)
                .max_age(time::Duration::minutes(OAUTH_STATE_LIFETIME_MINUTES));
            Ok((jar.add(cookie), found(&start.authorization_url)).into_response())
        }
        Err(e) => {
            warn!(provider = %provider, error = %e, "Cannot start OAuth sign-in");
            Ok(found(&state.auth.failure_redirect()))
        }
    }
}

/// GET /api/auth/oauth/{provider}/callback
pub async fn callback(
    State(state): State<AppState>,
    session: MaybeSession,
    jar: CookieJar,
    Path(provider): Path<String>,
    Query(params): Query<OAuthCallback>,
) -> (CookieJar, Response) {
    let nonce = jar
        .get(OAUTH_NONCE_COOKIE)
        .map(|cookie| cookie.value().to_owned());
    let jar = jar.remove(Cookie::build(OAUTH_NONCE_COOKIE).path(OAUTH_COOKIE_PATH));

    let Some(provider) = OAuthProvider::parse(&provider) else {
        warn!(provider = %provider, "OAuth callback for unknown provider");
        return (jar, found(&state.auth.failure_redirect()));
    };

    let outcome = state
        .auth
        .complete_oauth(provider, params, nonce.as_deref())
        .await;
    if let Some(user_id) = outcome.user_id {
        if let Err(e) = session.sign_in(user_id).await {
            error!(
                user_id = %user_id,
                provider = %provider,
                error = e.detail().unwrap_or(e.message()),
                "Failed to bind session after OAuth sign-in"
            );
            return (jar, found(&state.auth.failure_redirect()));
        }
    }
    (jar, found(&outcome.redirect_url))
}

/// GET /api/auth/oauth/me
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": current.user.to_info(),
    }))
}

/// POST /api/auth/oauth/logout
///
/// Destroys the cookie session. Bearer tokens stay valid until they expire.
pub async fn logout(
    Extension(current): Extension<CurrentUser>,
    session: MaybeSession,
) -> Result<Json<Value>, ApiError> {
    session.sign_out().await?;
    info!(user_id = %current.id, "User logged out");
    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully",
    })))
}
