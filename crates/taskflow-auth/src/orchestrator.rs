//! Request-level authentication flows
//!
//! [`AuthOrchestrator`] is what the HTTP layer talks to. It owns the
//! strategy registry, the token issuer and the credential store, and turns
//! their results into tokens, client-safe user info and redirect targets.

use crate::bridge::OAuthBridge;
use crate::claims::TokenClaims;
use crate::error::{AuthError, AuthResult};
use crate::jwt::TokenIssuer;
use crate::local::LocalAuthenticator;
use crate::oauth::{OAuthProvider, OAuthProviderClient};
use crate::store::CredentialStore;
use crate::strategy::{Credentials, StrategyKey, StrategyRegistry};
use crate::user::{User, UserInfo};
use chrono::Utc;
use oauth2::url::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A signed-in user together with the token that proves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: UserInfo,
    pub token: String,
}

/// Query parameters a provider sends back to the callback URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// A started OAuth round trip.
///
/// The caller hands `nonce` to the browser out of band (a cookie) and
/// presents it again on the callback; the signed `state` in the consent URL
/// only verifies together with it.
#[derive(Debug, Clone)]
pub struct OAuthStart {
    /// Provider consent screen to redirect the browser to
    pub authorization_url: String,
    /// Browser-bound value the callback must present
    pub nonce: String,
}

/// Where to send the browser after an OAuth callback.
#[derive(Debug, Clone)]
pub struct OAuthCompletion {
    /// Frontend URL, carrying the token on success
    pub redirect_url: String,
    /// Set when sign-in succeeded
    pub user_id: Option<Uuid>,
}

/// Coordinates registration, sign-in and token verification.
pub struct AuthOrchestrator {
    registry: StrategyRegistry,
    issuer: TokenIssuer,
    store: Arc<dyn CredentialStore>,
    local: LocalAuthenticator,
    frontend_url: Url,
    /// `jti` to expiry of state tokens already redeemed
    used_states: Mutex<HashMap<String, i64>>,
}

impl std::fmt::Debug for AuthOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthOrchestrator")
            .field("issuer", &self.issuer)
            .field("frontend_url", &self.frontend_url.as_str())
            .field("providers", &self.enabled_providers())
            .finish()
    }
}

impl AuthOrchestrator {
    /// Create an orchestrator with local sign-in enabled and no providers.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        issuer: TokenIssuer,
        frontend_url: &str,
    ) -> AuthResult<Self> {
        let frontend_url = Url::parse(frontend_url.trim_end_matches('/'))
            .map_err(|e| AuthError::ConfigError(format!("Invalid frontend URL: {}", e)))?;
        let local = LocalAuthenticator::new(store.clone())?;
        let registry = StrategyRegistry::new().with_local(local.clone());

        Ok(Self {
            registry,
            issuer,
            store,
            local,
            frontend_url,
            used_states: Mutex::new(HashMap::new()),
        })
    }

    /// Enable sign-in through the provider `client` talks to.
    pub fn with_provider(mut self, client: Arc<dyn OAuthProviderClient>) -> Self {
        let bridge = OAuthBridge::new(self.store.clone());
        self.registry = self.registry.with_provider(client, bridge);
        self
    }

    /// Providers with a registered strategy.
    pub fn enabled_providers(&self) -> Vec<OAuthProvider> {
        OAuthProvider::ALL
            .into_iter()
            .filter(|p| self.registry.contains(StrategyKey::Provider(*p)))
            .collect()
    }

    /// The token issuer.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Create a local account and sign it in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AuthResult<AuthSession> {
        let user = self.local.register(name, email, password).await?;
        info!(user_id = %user.id, "User registered");
        self.session_for(&user)
    }

    /// Sign in with email + password.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let user = self
            .registry
            .attempt(Credentials::Password {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        info!(user_id = %user.id, "User logged in");
        self.session_for(&user)
    }

    /// Resolve a bearer token to the user it was issued for.
    ///
    /// Fails with [`AuthError::NotFound`] when the token is valid but the
    /// user no longer exists.
    pub async fn authenticate(&self, token: &str) -> AuthResult<User> {
        let user_id = self.issuer.verify(token)?;
        self.current_user(user_id).await
    }

    /// Load the user behind an already verified identity.
    pub async fn current_user(&self, user_id: Uuid) -> AuthResult<User> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Consent-screen URL for `provider`, carrying a signed state value
    /// bound to a fresh browser nonce.
    pub fn begin_oauth(&self, provider: OAuthProvider) -> AuthResult<OAuthStart> {
        let client = self.registry.provider(provider).ok_or_else(|| {
            AuthError::ProviderError(format!("{} sign-in is not configured", provider))
        })?;
        let nonce = Uuid::new_v4().simple().to_string();
        let state = self.issuer.issue_oauth_state(provider.as_str(), &nonce)?;
        Ok(OAuthStart {
            authorization_url: client.authorization_url(&state)?,
            nonce,
        })
    }

    /// Finish an OAuth round trip for the browser presenting `nonce`.
    ///
    /// Never fails: any problem is logged and the browser is sent to the
    /// frontend login page with a generic error flag. A state value is
    /// accepted at most once.
    pub async fn complete_oauth(
        &self,
        provider: OAuthProvider,
        callback: OAuthCallback,
        nonce: Option<&str>,
    ) -> OAuthCompletion {
        match self.try_complete_oauth(provider, callback, nonce).await {
            Ok((session, redirect_url)) => {
                info!(user_id = %session.user.id, provider = %provider, "OAuth sign-in succeeded");
                OAuthCompletion {
                    redirect_url,
                    user_id: Some(session.user.id),
                }
            }
            Err(e) => {
                if e.is_server_error() {
                    error!(provider = %provider, error = %e, "OAuth sign-in failed");
                } else {
                    warn!(provider = %provider, error = %e, "OAuth sign-in failed");
                }
                OAuthCompletion {
                    redirect_url: self.failure_redirect(),
                    user_id: None,
                }
            }
        }
    }

    /// Frontend login page flagged with `error=auth_failed`.
    pub fn failure_redirect(&self) -> String {
        let mut url = self.frontend_page("login");
        url.query_pairs_mut().append_pair("error", "auth_failed");
        url.to_string()
    }

    async fn try_complete_oauth(
        &self,
        provider: OAuthProvider,
        callback: OAuthCallback,
        nonce: Option<&str>,
    ) -> AuthResult<(AuthSession, String)> {
        if let Some(err) = callback.error {
            return Err(AuthError::ProviderError(format!("provider returned {}", err)));
        }
        let state = callback
            .state
            .ok_or_else(|| AuthError::ProviderError("missing state".to_string()))?;
        let nonce =
            nonce.ok_or_else(|| AuthError::ProviderError("missing browser nonce".to_string()))?;
        let claims = self
            .issuer
            .verify_oauth_state(&state, provider.as_str(), nonce)
            .map_err(|e| AuthError::ProviderError(format!("state rejected: {}", e)))?;
        self.consume_state(&claims).await?;
        let code = callback
            .code
            .ok_or_else(|| AuthError::ProviderError("missing authorization code".to_string()))?;

        let user = self
            .registry
            .attempt(Credentials::AuthorizationCode { provider, code })
            .await?;
        let session = self.session_for(&user)?;

        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| AuthError::Internal(format!("Failed to encode user: {}", e)))?;
        let mut url = self.frontend_page("oauth-callback");
        url.query_pairs_mut()
            .append_pair("token", &session.token)
            .append_pair("user", &user_json);
        Ok((session, url.to_string()))
    }

    async fn consume_state(&self, claims: &TokenClaims) -> AuthResult<()> {
        let now = Utc::now().timestamp();
        let mut used = self.used_states.lock().await;
        used.retain(|_, exp| *exp >= now);
        if used.insert(claims.jti.clone(), claims.exp).is_some() {
            return Err(AuthError::ProviderError("state already used".to_string()));
        }
        Ok(())
    }

    fn session_for(&self, user: &User) -> AuthResult<AuthSession> {
        Ok(AuthSession {
            user: user.to_info(),
            token: self.issuer.issue(user.id)?,
        })
    }

    fn frontend_page(&self, page: &str) -> Url {
        let mut url = self.frontend_url.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), page);
        url.set_path(&path);
        url.set_query(None);
        url
    }
}
