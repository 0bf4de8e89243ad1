//! # Taskflow Authentication
//!
//! Identity for the Taskflow task service: local email + password accounts,
//! sign-in through Google and GitHub, and the JWT bearer tokens every
//! protected route checks.
//!
//! ## Overview
//!
//! - **Local accounts**: registration and login with Argon2 password hashes
//! - **OAuth 2.0**: authorization-code sign-in with Google and GitHub
//! - **Bridge**: provider profiles resolved to one local user per identity
//! - **JWT**: HMAC-signed access tokens and signed OAuth `state` values
//! - **Strategies**: every sign-in method behind one [`AuthStrategy`] seam
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskflow_auth::{AuthOrchestrator, MemoryCredentialStore, TokenIssuer};
//!
//! # async fn run() -> taskflow_auth::AuthResult<()> {
//! let store = Arc::new(MemoryCredentialStore::new());
//! let issuer = TokenIssuer::with_secret("your-secret-key")?;
//! let auth = AuthOrchestrator::new(store, issuer, "http://localhost:3000")?;
//!
//! let session = auth.register("Ann", "ann@example.com", "secret123").await?;
//! let user = auth.authenticate(&session.token).await?;
//! assert_eq!(user.id, session.user.id);
//! # Ok(())
//! # }
//! ```
//!
//! ### OAuth
//!
//! ```rust,no_run
//! use taskflow_auth::{client_for, OAuthConfig, OAuthProvider};
//!
//! let config = OAuthConfig::new(
//!     OAuthProvider::GitHub,
//!     "client-id",
//!     "client-secret",
//!     "http://localhost:5000/api/auth/oauth/github/callback",
//! );
//! let client = client_for(config).unwrap();
//! ```

pub mod bridge;
pub mod claims;
pub mod error;
pub mod jwt;
pub mod local;
pub mod oauth;
pub mod orchestrator;
pub mod password;
pub mod store;
pub mod strategy;
pub mod user;

// Re-export main types
pub use bridge::OAuthBridge;
pub use claims::{TokenClaims, TokenType};
pub use error::{AuthError, AuthResult};
pub use jwt::{JwtAlgorithm, JwtConfig, TokenIssuer};
pub use local::LocalAuthenticator;
pub use oauth::{
    client_for, GitHubClient, GoogleClient, OAuthConfig, OAuthProvider, OAuthProviderClient,
    ProfileEmail, ProviderProfile,
};
pub use orchestrator::{
    AuthOrchestrator, AuthSession, OAuthCallback, OAuthCompletion, OAuthStart,
};
pub use store::{CredentialStore, MemoryCredentialStore, OAuthIdentity, OAuthResolution};
pub use strategy::{AuthStrategy, Credentials, StrategyKey, StrategyRegistry};
pub use user::{AccountProvider, NewUser, User, UserInfo};
