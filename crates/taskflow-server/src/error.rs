//! HTTP error responses.
//!
//! Every handler error becomes an [`ApiError`], rendered as
//! `{"message": ..., "code": ...}`. Server-side failures are logged and
//! shown to the client as a generic message; in development the
//! [`expose_error_detail`] middleware adds the internal cause as `detail`.

use axum::extract::rejection::JsonRejection;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskflow_auth::AuthError;
use taskflow_tasks::TaskError;

/// An error ready to be sent to the client.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// A server-side failure. `detail` is logged, never shown in production.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Server Error")
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Internal cause of a server-side failure, never sent in production.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    fn render(&self, include_detail: bool) -> Response {
        let mut body = json!({
            "message": self.message,
            "code": self.code,
        });
        if include_detail {
            if let Some(detail) = &self.detail {
                body["detail"] = json!(detail);
            }
        }
        (self.status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                code = self.code,
                detail = self.detail.as_deref().unwrap_or(""),
                "Request failed"
            );
        }
        let mut response = self.render(false);
        response.extensions_mut().insert(self);
        response
    }
}

/// Re-render server errors with their internal detail. Development only.
pub async fn expose_error_detail(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let detailed = response
        .extensions()
        .get::<ApiError>()
        .filter(|error| error.detail.is_some())
        .map(|error| error.render(true));
    detailed.unwrap_or(response)
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let status =
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &e {
            AuthError::ValidationFailed(message) => message.clone(),
            AuthError::DuplicateEmail => "User already exists".to_string(),
            AuthError::InvalidCredentials => "Invalid credentials".to_string(),
            AuthError::InvalidToken(_) | AuthError::TokenExpired => {
                "Not authorized, token failed".to_string()
            }
            AuthError::NotFound => "User not found".to_string(),
            AuthError::ProviderError(_) | AuthError::NoEmail => {
                "Authentication provider error".to_string()
            }
            AuthError::ConfigError(_) | AuthError::Internal(_) => "Server Error".to_string(),
        };
        let detail = status.is_server_error().then(|| e.to_string());
        Self {
            status,
            code: e.error_code(),
            message,
            detail,
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        let status =
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = e.error_code();
        match e {
            TaskError::ValidationFailed(message) => Self::new(status, code, message),
            TaskError::NotFound => Self::new(status, code, "Task not found"),
            TaskError::Forbidden => Self::new(status, code, "Not authorized to modify this task"),
            TaskError::Internal(detail) => Self::internal(detail),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(e: tower_sessions::session::Error) -> Self {
        Self::internal(format!("session store: {}", e))
    }
}
