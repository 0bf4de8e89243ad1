//! JWT token issuance and verification
//!
//! [`TokenIssuer`] signs bearer tokens binding a user ID and verifies them
//! statelessly (signature + expiry). There is no revocation list: a token
//! stays valid until it expires or the secret is rotated.

use crate::claims::{TokenClaims, TokenType, ISSUER};
use crate::error::{AuthError, AuthResult};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest accepted access-token lifetime.
pub const MIN_TOKEN_LIFETIME_DAYS: i64 = 7;

/// Longest accepted access-token lifetime.
pub const MAX_TOKEN_LIFETIME_DAYS: i64 = 30;

/// Lifetime of the OAuth `state` token.
pub const OAUTH_STATE_LIFETIME_MINUTES: i64 = 10;

/// JWT configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC
    pub secret: String,

    /// Algorithm to use
    pub algorithm: JwtAlgorithm,

    /// Access token duration
    pub token_lifetime: Duration,

    /// OAuth state token duration
    pub state_lifetime: Duration,
}

impl JwtConfig {
    /// Create a configuration with the default lifetime (30 days).
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: JwtAlgorithm::HS256,
            token_lifetime: Duration::days(MAX_TOKEN_LIFETIME_DAYS),
            state_lifetime: Duration::minutes(OAUTH_STATE_LIFETIME_MINUTES),
        }
    }

    /// Set the signing algorithm.
    pub fn with_algorithm(mut self, algorithm: JwtAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the access token lifetime, clamped to 7..=30 days.
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime.clamp(
            Duration::days(MIN_TOKEN_LIFETIME_DAYS),
            Duration::days(MAX_TOKEN_LIFETIME_DAYS),
        );
        self
    }
}

/// Supported JWT algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl JwtAlgorithm {
    /// Parse an algorithm name such as `HS256`, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Some(Self::HS256),
            "HS384" => Some(Self::HS384),
            "HS512" => Some(Self::HS512),
            _ => None,
        }
    }
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Signs and verifies tokens.
pub struct TokenIssuer {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.config.algorithm)
            .field("token_lifetime", &self.config.token_lifetime)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl TokenIssuer {
    /// Create a new issuer with the given configuration.
    ///
    /// Fails with [`AuthError::ConfigError`] when the secret is empty.
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::ConfigError(
                "Secret required for HMAC".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Create with a simple secret (HS256, default lifetime).
    pub fn with_secret(secret: impl Into<String>) -> AuthResult<Self> {
        Self::new(JwtConfig::new(secret))
    }

    /// Issue an access token for a user.
    pub fn issue(&self, user_id: Uuid) -> AuthResult<String> {
        let claims = TokenClaims::access(user_id, self.config.token_lifetime);
        self.encode_claims(&claims)
    }

    /// Verify an access token and return the user it was issued for.
    pub fn verify(&self, token: &str) -> AuthResult<Uuid> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Access {
            return Err(AuthError::InvalidToken("Not an access token".to_string()));
        }
        claims
            .user_id()
            .ok_or_else(|| AuthError::InvalidToken("Malformed subject".to_string()))
    }

    /// Issue the signed `state` parameter for an OAuth redirect, bound to
    /// the browser that holds `nonce`.
    pub fn issue_oauth_state(&self, provider: &str, nonce: &str) -> AuthResult<String> {
        let claims = TokenClaims::oauth_state(provider, nonce, self.config.state_lifetime);
        self.encode_claims(&claims)
    }

    /// Verify a `state` parameter returned by `provider` to the browser
    /// holding `nonce`.
    pub fn verify_oauth_state(
        &self,
        token: &str,
        provider: &str,
        nonce: &str,
    ) -> AuthResult<TokenClaims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::OAuthState {
            return Err(AuthError::InvalidToken("Not a state token".to_string()));
        }
        if claims.provider.as_deref() != Some(provider) {
            return Err(AuthError::InvalidToken(
                "State issued for another provider".to_string(),
            ));
        }
        if nonce.is_empty() || claims.nonce.as_deref() != Some(nonce) {
            return Err(AuthError::InvalidToken(
                "State issued to another browser".to_string(),
            ));
        }
        Ok(claims)
    }

    /// Encode arbitrary claims with the configured key.
    pub fn encode_claims(&self, claims: &TokenClaims) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm.into());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Validate signature, issuer and expiry, and decode the claims.
    pub fn validate_token(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::new(self.config.algorithm.into());
        validation.set_issuer(&[ISSUER]);
        validation.validate_aud = false;
        validation.leeway = 0;

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AuthError::InvalidToken("Malformed token".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::InvalidToken("Invalid signature".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AuthError::InvalidToken("Invalid issuer".to_string())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }

    /// Get the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_secret() -> String {
        "test-secret-key-for-jwt-signing-minimum-32-chars".to_string()
    }

    #[test]
    fn test_issuer_creation() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        assert_eq!(issuer.config().algorithm, JwtAlgorithm::HS256);
        assert_eq!(issuer.config().token_lifetime, Duration::days(30));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = TokenIssuer::with_secret("");
        assert!(matches!(result, Err(AuthError::ConfigError(_))));
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        for _ in 0..5 {
            let user_id = Uuid::now_v7();
            let token = issuer.issue(user_id).unwrap();
            assert_eq!(issuer.verify(&token).unwrap(), user_id);
        }
    }

    #[test]
    fn test_tokens_are_distinct() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        let user_id = Uuid::now_v7();
        assert_ne!(issuer.issue(user_id).unwrap(), issuer.issue(user_id).unwrap());
    }

    #[test]
    fn test_invalid_token() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        let result = issuer.verify("invalid-token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_tampered_token() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        let token = issuer.issue(Uuid::now_v7()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let other = issuer.issue(Uuid::now_v7()).unwrap();
        parts[1] = other.split('.').nth(1).unwrap().to_string();
        let forged = format!("{}.{}.{}", parts[0], parts[1], parts[2]);

        assert!(matches!(issuer.verify(&forged), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        let other = TokenIssuer::with_secret("another-secret-entirely-for-signing").unwrap();
        let token = other.issue(Uuid::now_v7()).unwrap();

        assert!(matches!(issuer.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        let mut claims = TokenClaims::access(Uuid::now_v7(), Duration::days(7));
        claims.iat -= 8 * 24 * 3600;
        claims.nbf = claims.iat;
        claims.exp = chrono::Utc::now().timestamp() - 3600;

        let token = issuer.encode_claims(&claims).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_token_rejected_right_after_expiry() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        let mut claims = TokenClaims::access(Uuid::now_v7(), Duration::days(7));
        let now = chrono::Utc::now().timestamp();
        claims.iat = now - 60;
        claims.nbf = claims.iat;
        claims.exp = now - 1;

        let token = issuer.encode_claims(&claims).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_algorithm_is_configurable() {
        let issuer = TokenIssuer::new(
            JwtConfig::new(test_secret()).with_algorithm(JwtAlgorithm::HS512),
        )
        .unwrap();
        let user_id = Uuid::now_v7();
        let token = issuer.issue(user_id).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
        assert_eq!(issuer.verify(&token).unwrap(), user_id);

        // A token signed with the same secret but another algorithm is refused.
        let hs256 = TokenIssuer::with_secret(test_secret()).unwrap();
        assert!(issuer.verify(&hs256.issue(user_id).unwrap()).is_err());
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(JwtAlgorithm::parse("hs384"), Some(JwtAlgorithm::HS384));
        assert_eq!(JwtAlgorithm::parse("HS512"), Some(JwtAlgorithm::HS512));
        assert_eq!(JwtAlgorithm::parse("RS256"), None);
    }

    #[test]
    fn test_lifetime_is_clamped() {
        let config = JwtConfig::new(test_secret()).with_token_lifetime(Duration::days(365));
        assert_eq!(config.token_lifetime, Duration::days(30));

        let config = JwtConfig::new(test_secret()).with_token_lifetime(Duration::hours(1));
        assert_eq!(config.token_lifetime, Duration::days(7));
    }

    #[test]
    fn test_oauth_state_roundtrip() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        let state = issuer.issue_oauth_state("google", "nonce-a").unwrap();

        let claims = issuer.verify_oauth_state(&state, "google", "nonce-a").unwrap();
        assert_eq!(claims.nonce.as_deref(), Some("nonce-a"));
        assert!(issuer.verify_oauth_state(&state, "github", "nonce-a").is_err());
    }

    #[test]
    fn test_oauth_state_bound_to_nonce() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        let state = issuer.issue_oauth_state("github", "nonce-a").unwrap();

        assert!(matches!(
            issuer.verify_oauth_state(&state, "github", "nonce-b"),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(issuer.verify_oauth_state(&state, "github", "").is_err());
    }

    #[test]
    fn test_state_token_is_not_an_access_token() {
        let issuer = TokenIssuer::with_secret(test_secret()).unwrap();
        let state = issuer.issue_oauth_state("google", "nonce-a").unwrap();
        assert!(matches!(issuer.verify(&state), Err(AuthError::InvalidToken(_))));

        let access = issuer.issue(Uuid::now_v7()).unwrap();
        assert!(issuer.verify_oauth_state(&access, "google", "nonce-a").is_err());
    }
}
