//! OAuth 2.0 provider support
//!
//! Each supported provider gets a client implementing
//! [`OAuthProviderClient`]: build the consent URL, exchange the returned
//! authorization code for a provider access token, and fetch the profile
//! that the [`OAuthBridge`](crate::bridge::OAuthBridge) turns into a local
//! user.

mod github;
mod google;

pub use github::GitHubClient;
pub use google::GoogleClient;

use crate::error::{AuthError, AuthResult};
use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Supported OAuth providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OAuthProvider {
    /// Google OAuth
    Google,
    /// GitHub OAuth
    #[serde(rename = "github")]
    GitHub,
}

impl OAuthProvider {
    /// Every provider, in registration order.
    pub const ALL: [OAuthProvider; 2] = [OAuthProvider::Google, OAuthProvider::GitHub];

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::GitHub => "github",
        }
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "google" => Some(OAuthProvider::Google),
            "github" => Some(OAuthProvider::GitHub),
            _ => None,
        }
    }

    /// Get the default authorization URL for the provider.
    pub fn auth_url(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            OAuthProvider::GitHub => "https://github.com/login/oauth/authorize",
        }
    }

    /// Get the default token URL for the provider.
    pub fn token_url(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://oauth2.googleapis.com/token",
            OAuthProvider::GitHub => "https://github.com/login/oauth/access_token",
        }
    }

    /// Base URL of the API serving the user profile.
    pub fn api_base_url(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://www.googleapis.com",
            OAuthProvider::GitHub => "https://api.github.com",
        }
    }

    /// Get default scopes for the provider.
    pub fn default_scopes(&self) -> Vec<&'static str> {
        match self {
            OAuthProvider::Google => vec!["profile", "email"],
            OAuthProvider::GitHub => vec!["user:email"],
        }
    }
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Provider type
    pub provider: OAuthProvider,

    /// Client ID
    pub client_id: String,

    /// Client secret
    pub client_secret: String,

    /// Redirect URL registered with the provider
    pub redirect_url: String,

    /// Scopes to request
    pub scopes: Vec<String>,

    /// Authorization URL (optional, uses the provider default)
    pub auth_url: Option<String>,

    /// Token URL (optional, uses the provider default)
    pub token_url: Option<String>,

    /// Profile API base URL (optional, uses the provider default)
    pub api_base_url: Option<String>,
}

impl OAuthConfig {
    /// Create a new OAuth configuration with the provider's default scopes.
    pub fn new(
        provider: OAuthProvider,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            scopes: provider
                .default_scopes()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            auth_url: None,
            token_url: None,
            api_base_url: None,
        }
    }

    /// Get the authorization URL.
    pub fn get_auth_url(&self) -> &str {
        self.auth_url
            .as_deref()
            .unwrap_or_else(|| self.provider.auth_url())
    }

    /// Get the token URL.
    pub fn get_token_url(&self) -> &str {
        self.token_url
            .as_deref()
            .unwrap_or_else(|| self.provider.token_url())
    }

    /// Build a profile API URL from a path.
    pub fn api_url(&self, path: &str) -> String {
        let base = self
            .api_base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.api_base_url())
            .trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// One email address asserted by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEmail {
    pub value: String,
    pub primary: bool,
    pub verified: bool,
}

/// Identity bundle returned by a provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Provider-assigned user ID
    pub external_id: String,

    /// Display name, when the user set one
    pub display_name: Option<String>,

    /// Login handle (GitHub)
    pub username: Option<String>,

    /// Addresses known to the provider
    pub emails: Vec<ProfileEmail>,
}

impl ProviderProfile {
    /// The address to bind the local account to.
    ///
    /// Addresses the provider reports as unverified are never used. Among the
    /// rest the primary one wins, otherwise the first listed.
    pub fn usable_email(&self) -> Option<&str> {
        let mut usable = self
            .emails
            .iter()
            .filter(|e| e.verified && !e.value.trim().is_empty());
        let first = usable.clone().next();
        usable
            .find(|e| e.primary)
            .or(first)
            .map(|e| e.value.as_str())
    }

    /// Display name, falling back to the login handle, then the email's local part.
    pub fn name_or(&self, email: &str) -> String {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
    }
}

/// Trait for OAuth provider implementations.
#[async_trait]
pub trait OAuthProviderClient: Send + Sync {
    /// Which provider this client talks to.
    fn provider(&self) -> OAuthProvider;

    /// Consent-screen URL carrying `state` and the configured scopes.
    fn authorization_url(&self, state: &str) -> AuthResult<String>;

    /// Exchange an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str) -> AuthResult<String>;

    /// Fetch the signed-in user's profile.
    async fn fetch_profile(&self, access_token: &str) -> AuthResult<ProviderProfile>;
}

/// Build the client for a configured provider.
pub fn client_for(config: OAuthConfig) -> AuthResult<Arc<dyn OAuthProviderClient>> {
    Ok(match config.provider {
        OAuthProvider::Google => Arc::new(GoogleClient::new(config)?),
        OAuthProvider::GitHub => Arc::new(GitHubClient::new(config)?),
    })
}

/// Authorization-code plumbing shared by every provider client.
#[derive(Debug, Clone)]
pub(crate) struct CodeFlow {
    config: OAuthConfig,
    client: BasicClient,
    http: reqwest::Client,
}

impl CodeFlow {
    pub(crate) fn new(config: OAuthConfig) -> AuthResult<Self> {
        let auth_url = AuthUrl::new(config.get_auth_url().to_string())
            .map_err(|e| AuthError::ConfigError(format!("Invalid authorization URL: {}", e)))?;
        let token_url = TokenUrl::new(config.get_token_url().to_string())
            .map_err(|e| AuthError::ConfigError(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_url.clone())
            .map_err(|e| AuthError::ConfigError(format!("Invalid redirect URL: {}", e)))?;

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        let http = reqwest::Client::builder()
            .user_agent(concat!("taskflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            http,
        })
    }

    pub(crate) fn authorization_url(&self, state: &str) -> String {
        let state = state.to_string();
        let (url, _) = self
            .client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(self.config.scopes.iter().cloned().map(Scope::new))
            .url();
        url.to_string()
    }

    pub(crate) async fn exchange_code(&self, code: &str) -> AuthResult<String> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::ProviderError(format!("Token exchange failed: {}", e)))?;
        Ok(token.access_token().secret().clone())
    }

    /// GET a profile endpoint with the provider access token.
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> AuthResult<T> {
        let url = self.config.api_url(path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::ProviderError(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::ProviderError(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ProviderError(format!("Invalid response from {}: {}", url, e)))
    }
}
