//! # Taskflow Server
//!
//! The HTTP API: local and OAuth sign-in, the authenticated session
//! endpoints, and CRUD over the caller's tasks.
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | `POST` | `/api/auth/register` | |
//! | `POST` | `/api/auth/login` | |
//! | `GET` | `/api/auth/failure` | |
//! | `GET` | `/api/auth/oauth/{provider}` | |
//! | `GET` | `/api/auth/oauth/{provider}/callback` | |
//! | `GET` | `/api/auth/oauth/me` | required |
//! | `POST` | `/api/auth/oauth/logout` | required |
//! | `GET`, `POST` | `/api/tasks` | required |
//! | `PUT`, `DELETE` | `/api/tasks/{id}` | required |
//! | `GET` | `/health` | |

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ConfigError, Environment, ServerConfig};
pub use error::ApiError;
pub use middleware::CurrentUser;
pub use state::AppState;

use axum::routing::{get, post, put};
use axum::Router;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "taskflow.sid";

/// Idle time after which a cookie session expires.
pub const SESSION_IDLE_HOURS: i64 = 24;

/// Build the application router.
pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(routes::health))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/failure", get(routes::auth::failure))
        .route("/api/auth/oauth/{provider}", get(routes::oauth::begin))
        .route(
            "/api/auth/oauth/{provider}/callback",
            get(routes::oauth::callback),
        );

    let protected = Router::new()
        .route("/api/auth/oauth/me", get(routes::oauth::me))
        .route("/api/auth/oauth/logout", post(routes::oauth::logout))
        .route(
            "/api/tasks",
            get(routes::tasks::list).post(routes::tasks::create),
        )
        .route(
            "/api/tasks/{id}",
            put(routes::tasks::update).delete(routes::tasks::delete),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let mut app = public.merge(protected).with_state(state);

    if config.sessions_enabled {
        let sessions = SessionManagerLayer::new(MemoryStore::default())
            .with_name(SESSION_COOKIE)
            .with_secure(config.is_production())
            .with_expiry(Expiry::OnInactivity(Duration::hours(SESSION_IDLE_HOURS)));
        app = app.layer(sessions);
    }
    if !config.is_production() {
        app = app.layer(axum::middleware::from_fn(error::expose_error_detail));
    }

    app.layer(TraceLayer::new_for_http())
}
