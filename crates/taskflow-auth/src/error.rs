//! Error types for authentication operations
//!
//! Every failure the login, registration, token and OAuth paths can produce
//! is one variant of [`AuthError`]. Callers branch on the variant; the
//! message is for logs only.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed input
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Registration with an email that already belongs to an account
    #[error("User already exists")]
    DuplicateEmail,

    /// Unknown email, wrong password, or an account without a local password.
    /// The three cases are deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// JWT token is invalid (malformed, bad signature, wrong type)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// JWT token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Upstream OAuth failure (code exchange, profile fetch, state mismatch)
    #[error("OAuth provider error: {0}")]
    ProviderError(String),

    /// Provider profile carried no usable email address
    #[error("Provider profile has no email address")]
    NoEmail,

    /// A token resolved to a user that is no longer in the store
    #[error("User not found")]
    NotFound,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Credential and token failures are expected traffic and are not.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::Internal(_) | AuthError::ConfigError(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::ValidationFailed(_) | AuthError::DuplicateEmail => 400,

            AuthError::InvalidCredentials
            | AuthError::InvalidToken(_)
            | AuthError::TokenExpired
            | AuthError::NotFound => 401,

            AuthError::ProviderError(_) | AuthError::NoEmail => 502,

            AuthError::ConfigError(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::ValidationFailed(_) => "VALIDATION_FAILED",
            AuthError::DuplicateEmail => "DUPLICATE_EMAIL",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::ProviderError(_) => "PROVIDER_ERROR",
            AuthError::NoEmail => "NO_EMAIL",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
