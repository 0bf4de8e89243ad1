//! Google sign-in.

use super::{CodeFlow, OAuthConfig, OAuthProvider, OAuthProviderClient, ProfileEmail, ProviderProfile};
use crate::error::AuthResult;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Response of `GET /oauth2/v3/userinfo`.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

/// Google OAuth client.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    flow: CodeFlow,
}

impl GoogleClient {
    /// Create a client from its configuration.
    pub fn new(config: OAuthConfig) -> AuthResult<Self> {
        Ok(Self {
            flow: CodeFlow::new(config)?,
        })
    }
}

#[async_trait]
impl OAuthProviderClient for GoogleClient {
    fn provider(&self) -> OAuthProvider {
        OAuthProvider::Google
    }

    fn authorization_url(&self, state: &str) -> AuthResult<String> {
        Ok(self.flow.authorization_url(state))
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<String> {
        self.flow.exchange_code(code).await
    }

    #[instrument(skip_all, fields(provider = "google"))]
    async fn fetch_profile(&self, access_token: &str) -> AuthResult<ProviderProfile> {
        let info: GoogleUserInfo = self
            .flow
            .get_json("/oauth2/v3/userinfo", access_token)
            .await?;
        debug!(external_id = %info.sub, "Fetched Google profile");

        Ok(ProviderProfile {
            external_id: info.sub,
            display_name: info.name,
            username: None,
            emails: info
                .email
                .map(|value| ProfileEmail {
                    value,
                    primary: true,
                    verified: info.email_verified,
                })
                .into_iter()
                .collect(),
        })
    }
}
