//! JWT claims
//!
//! One claims structure covers both token kinds the service signs: bearer
//! access tokens handed to clients, and the short-lived `state` tokens that
//! protect the OAuth redirect round trip.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into every token.
pub const ISSUER: &str = "taskflow";

/// Claims carried by every token the service signs.
///
/// # Example
///
/// ```rust
/// use taskflow_auth::claims::TokenClaims;
/// use uuid::Uuid;
///
/// let user_id = Uuid::now_v7();
/// let claims = TokenClaims::access(user_id, chrono::Duration::days(30));
/// assert_eq!(claims.user_id(), Some(user_id));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID for access tokens, random nonce for state tokens)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// JWT ID, unique per token so two tokens for the same user never collide
    pub jti: String,

    /// Token type
    pub token_type: TokenType,

    /// Provider the OAuth flow was started for (state tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Browser-bound value the OAuth callback must present again (state tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl TokenClaims {
    /// Create access-token claims for a user.
    pub fn access(user_id: Uuid, duration: chrono::Duration) -> Self {
        Self::new(user_id.to_string(), TokenType::Access, duration)
    }

    /// Create state-token claims for an OAuth round trip to `provider`,
    /// bound to the browser holding `nonce`.
    pub fn oauth_state(
        provider: impl Into<String>,
        nonce: impl Into<String>,
        duration: chrono::Duration,
    ) -> Self {
        let mut claims = Self::new(Uuid::now_v7().to_string(), TokenType::OAuthState, duration);
        claims.provider = Some(provider.into());
        claims.nonce = Some(nonce.into());
        claims
    }

    fn new(sub: String, token_type: TokenType, duration: chrono::Duration) -> Self {
        let now = Utc::now();
        let exp = now + duration;

        Self {
            sub,
            iss: ISSUER.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            token_type,
            provider: None,
            nonce: None,
        }
    }

    /// Get the user ID as UUID.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Token type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Bearer token presented on API requests
    #[default]
    Access,

    /// CSRF `state` parameter of an OAuth redirect
    OAuthState,
}
