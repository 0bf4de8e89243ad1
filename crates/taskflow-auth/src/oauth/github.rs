//! GitHub sign-in.
//!
//! `/user` only carries the public email, which many accounts leave empty,
//! so the client also reads `/user/emails` (granted by the `user:email`
//! scope) when the public one is missing.

use super::{CodeFlow, OAuthConfig, OAuthProvider, OAuthProviderClient, ProfileEmail, ProviderProfile};
use crate::error::AuthResult;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// GitHub user info from API.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

/// GitHub email info from API.
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// GitHub OAuth client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    flow: CodeFlow,
}

impl GitHubClient {
    /// Create a client from its configuration.
    pub fn new(config: OAuthConfig) -> AuthResult<Self> {
        Ok(Self {
            flow: CodeFlow::new(config)?,
        })
    }
}

#[async_trait]
impl OAuthProviderClient for GitHubClient {
    fn provider(&self) -> OAuthProvider {
        OAuthProvider::GitHub
    }

    fn authorization_url(&self, state: &str) -> AuthResult<String> {
        Ok(self.flow.authorization_url(state))
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<String> {
        self.flow.exchange_code(code).await
    }

    #[instrument(skip_all, fields(provider = "github"))]
    async fn fetch_profile(&self, access_token: &str) -> AuthResult<ProviderProfile> {
        let user: GitHubUser = self.flow.get_json("/user", access_token).await?;
        debug!(external_id = user.id, login = %user.login, "Fetched GitHub profile");

        let emails = match user.email.filter(|e| !e.trim().is_empty()) {
            // GitHub only publishes verified addresses on the profile.
            Some(email) => vec![ProfileEmail {
                value: email,
                primary: true,
                verified: true,
            }],
            None => {
                let emails: Vec<GitHubEmail> =
                    self.flow.get_json("/user/emails", access_token).await?;
                emails
                    .into_iter()
                    .map(|e| ProfileEmail {
                        value: e.email,
                        primary: e.primary,
                        verified: e.verified,
                    })
                    .collect()
            }
        };

        Ok(ProviderProfile {
            external_id: user.id.to_string(),
            display_name: user.name,
            username: Some(user.login),
            emails,
        })
    }
}
