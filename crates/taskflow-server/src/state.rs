//! Shared application state.

use crate::config::ServerConfig;
use std::sync::Arc;
use taskflow_auth::{
    client_for, AuthOrchestrator, AuthResult, CredentialStore, JwtConfig, MemoryCredentialStore,
    TokenIssuer,
};
use taskflow_tasks::{MemoryTaskRepository, TaskService};
use tracing::info;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthOrchestrator>,
    pub tasks: TaskService,
    /// Mark cookies the server sets as `Secure`.
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(auth: AuthOrchestrator, tasks: TaskService) -> Self {
        Self {
            auth: Arc::new(auth),
            tasks,
            secure_cookies: false,
        }
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Wire in-memory stores, the token issuer and every configured
    /// provider. The strategy registry is assembled here, once.
    pub fn from_config(config: &ServerConfig) -> AuthResult<Self> {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let issuer = TokenIssuer::new(
            JwtConfig::new(config.signing_secret())
                .with_algorithm(config.jwt_algorithm)
                .with_token_lifetime(config.jwt_lifetime()),
        )?;

        let mut auth = AuthOrchestrator::new(store, issuer, &config.frontend_url)?;
        for oauth in config.oauth_configs() {
            info!(provider = %oauth.provider, "OAuth provider enabled");
            auth = auth.with_provider(client_for(oauth)?);
        }

        let tasks = TaskService::new(Arc::new(MemoryTaskRepository::new()));
        Ok(Self::new(auth, tasks).with_secure_cookies(config.is_production()))
    }
}
