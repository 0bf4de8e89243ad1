//! Authentication strategies
//!
//! Every way of signing in implements [`AuthStrategy`]. The
//! [`StrategyRegistry`] is assembled once at startup and handed to the
//! orchestrator, so adding a provider means registering one more strategy.

use crate::bridge::OAuthBridge;
use crate::error::{AuthError, AuthResult};
use crate::local::LocalAuthenticator;
use crate::oauth::{OAuthProvider, OAuthProviderClient};
use crate::user::User;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// What a caller presents to a strategy.
#[derive(Clone)]
pub enum Credentials {
    /// Local email + password
    Password { email: String, password: String },
    /// Authorization code returned by a provider's consent screen
    AuthorizationCode { provider: OAuthProvider, code: String },
}

impl Credentials {
    /// Key of the strategy able to handle these credentials.
    pub fn strategy_key(&self) -> StrategyKey {
        match self {
            Credentials::Password { .. } => StrategyKey::Local,
            Credentials::AuthorizationCode { provider, .. } => StrategyKey::Provider(*provider),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .field("password", &"[REDACTED]")
                .finish(),
            Credentials::AuthorizationCode { provider, .. } => f
                .debug_struct("AuthorizationCode")
                .field("provider", provider)
                .field("code", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Registry key of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKey {
    Local,
    Provider(OAuthProvider),
}

impl std::fmt::Display for StrategyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKey::Local => f.write_str("local"),
            StrategyKey::Provider(provider) => f.write_str(provider.as_str()),
        }
    }
}

/// One way of turning credentials into a user.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Registry key this strategy answers to.
    fn key(&self) -> StrategyKey;

    /// Authenticate, returning the resolved user or the reason it failed.
    async fn attempt(&self, credentials: Credentials) -> AuthResult<User>;
}

/// Email + password sign-in.
pub struct LocalStrategy {
    authenticator: LocalAuthenticator,
}

impl LocalStrategy {
    pub fn new(authenticator: LocalAuthenticator) -> Self {
        Self { authenticator }
    }
}

#[async_trait]
impl AuthStrategy for LocalStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Local
    }

    async fn attempt(&self, credentials: Credentials) -> AuthResult<User> {
        match credentials {
            Credentials::Password { email, password } => {
                self.authenticator.login(&email, &password).await
            }
            other => Err(AuthError::Internal(format!(
                "local strategy cannot handle {:?}",
                other
            ))),
        }
    }
}

/// Sign-in through an external provider: code exchange, profile fetch, and
/// resolution to a local user through the bridge.
pub struct ProviderStrategy {
    client: Arc<dyn OAuthProviderClient>,
    bridge: OAuthBridge,
}

impl ProviderStrategy {
    pub fn new(client: Arc<dyn OAuthProviderClient>, bridge: OAuthBridge) -> Self {
        Self { client, bridge }
    }

    /// The provider client, for building consent URLs.
    pub fn client(&self) -> &Arc<dyn OAuthProviderClient> {
        &self.client
    }
}

#[async_trait]
impl AuthStrategy for ProviderStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Provider(self.client.provider())
    }

    async fn attempt(&self, credentials: Credentials) -> AuthResult<User> {
        let provider = self.client.provider();
        let code = match credentials {
            Credentials::AuthorizationCode { provider: p, code } if p == provider => code,
            other => {
                return Err(AuthError::Internal(format!(
                    "{} strategy cannot handle {:?}",
                    provider, other
                )))
            }
        };
        if code.trim().is_empty() {
            return Err(AuthError::ProviderError(
                "missing authorization code".to_string(),
            ));
        }

        let access_token = self.client.exchange_code(&code).await?;
        let profile = self.client.fetch_profile(&access_token).await?;
        debug!(provider = %provider, external_id = %profile.external_id, "Provider profile received");
        self.bridge.handle_callback(provider, &profile).await
    }
}

/// Strategies available to the orchestrator, keyed by [`StrategyKey`].
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<StrategyKey, Arc<dyn AuthStrategy>>,
    providers: HashMap<OAuthProvider, Arc<dyn OAuthProviderClient>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the local email + password strategy.
    pub fn with_local(mut self, authenticator: LocalAuthenticator) -> Self {
        self.register(Arc::new(LocalStrategy::new(authenticator)));
        self
    }

    /// Register a provider strategy backed by `client`.
    pub fn with_provider(mut self, client: Arc<dyn OAuthProviderClient>, bridge: OAuthBridge) -> Self {
        self.providers.insert(client.provider(), client.clone());
        self.register(Arc::new(ProviderStrategy::new(client, bridge)));
        self
    }

    /// Register an arbitrary strategy, replacing any with the same key.
    pub fn register(&mut self, strategy: Arc<dyn AuthStrategy>) {
        self.strategies.insert(strategy.key(), strategy);
    }

    /// Client for a configured provider.
    pub fn provider(&self, provider: OAuthProvider) -> Option<&Arc<dyn OAuthProviderClient>> {
        self.providers.get(&provider)
    }

    /// Whether a strategy is registered under `key`.
    pub fn contains(&self, key: StrategyKey) -> bool {
        self.strategies.contains_key(&key)
    }

    /// Dispatch credentials to the matching strategy.
    pub async fn attempt(&self, credentials: Credentials) -> AuthResult<User> {
        let key = credentials.strategy_key();
        let strategy = self.strategies.get(&key).ok_or_else(|| match key {
            StrategyKey::Local => AuthError::ConfigError("local sign-in is not enabled".to_string()),
            StrategyKey::Provider(provider) => {
                AuthError::ProviderError(format!("{} sign-in is not configured", provider))
            }
        })?;
        strategy.attempt(credentials).await
    }
}
