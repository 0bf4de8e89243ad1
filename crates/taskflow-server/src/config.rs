//! Server configuration.
//!
//! Loaded from environment variables with defaults suitable for local
//! development. Production deployments must set `JWT_SECRET`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskflow_auth::{JwtAlgorithm, OAuthConfig, OAuthProvider};
use thiserror::Error;

/// Signing secret used when `JWT_SECRET` is unset outside production.
pub const DEV_JWT_SECRET: &str = "taskflow-development-secret";

/// Shortest `JWT_SECRET` accepted in production, in bytes.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Client credentials for one OAuth provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

/// Server configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Deployment environment.
    pub environment: Environment,

    /// Token signing secret. `None` falls back to [`DEV_JWT_SECRET`].
    pub jwt_secret: Option<String>,

    /// Access token lifetime in seconds, before clamping.
    pub jwt_lifetime_secs: i64,

    /// HMAC algorithm tokens are signed with.
    pub jwt_algorithm: JwtAlgorithm,

    /// Base URL of the web frontend that OAuth redirects land on.
    pub frontend_url: String,

    /// Google sign-in, enabled when client ID and secret are set.
    pub google: Option<ProviderCredentials>,

    /// GitHub sign-in, enabled when client ID and secret are set.
    pub github: Option<ProviderCredentials>,

    /// Whether the cookie-session path is available.
    pub sessions_enabled: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_lifetime_secs", &self.jwt_lifetime_secs)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("frontend_url", &self.frontend_url)
            .field("google", &self.google)
            .field("github", &self.github)
            .field("sessions_enabled", &self.sessions_enabled)
            .finish()
    }
}

impl Default for ServerConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            environment: Environment::Development,
            jwt_secret: None,
            jwt_lifetime_secs: Duration::days(30).num_seconds(),
            jwt_algorithm: JwtAlgorithm::HS256,
            frontend_url: "http://localhost:3000".to_string(),
            google: None,
            github: None,
            sessions_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HOST`, `PORT`: bind address (default: 127.0.0.1:5000)
    /// - `APP_ENV`: `development` or `production` (default: development)
    /// - `JWT_SECRET`: token signing secret
    /// - `JWT_EXPIRE`: token lifetime such as `30d` or `12h` (default: 30d)
    /// - `JWT_ALGORITHM`: `HS256`, `HS384` or `HS512` (default: HS256)
    /// - `FRONTEND_URL`: redirect base (default: http://localhost:3000)
    /// - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_CALLBACK_URL`
    /// - `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET`, `GITHUB_CALLBACK_URL`
    /// - `SESSIONS_ENABLED`: cookie sessions on or off (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or(default.host);
        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("'{}' is not a port number", raw),
            })?,
            None => default.port,
        };
        let environment = match var("APP_ENV").as_deref().map(str::trim) {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "APP_ENV".to_string(),
                    message: format!("unknown environment '{}'", other),
                })
            }
        };
        let jwt_lifetime_secs = match var("JWT_EXPIRE") {
            Some(raw) => parse_lifetime(&raw)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "JWT_EXPIRE".to_string(),
                    message: format!("'{}' is not a lifetime like 30d or 12h", raw),
                })?
                .num_seconds(),
            None => default.jwt_lifetime_secs,
        };
        let jwt_algorithm = match var("JWT_ALGORITHM") {
            Some(raw) => JwtAlgorithm::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "JWT_ALGORITHM".to_string(),
                message: format!("'{}' is not one of HS256, HS384, HS512", raw),
            })?,
            None => default.jwt_algorithm,
        };

        let callback_base = format!("http://localhost:{}", port);
        let credentials = |provider: OAuthProvider| {
            let prefix = provider.as_str().to_uppercase();
            let client_id = var(&format!("{}_CLIENT_ID", prefix))?;
            let client_secret = var(&format!("{}_CLIENT_SECRET", prefix))?;
            let callback_url = var(&format!("{}_CALLBACK_URL", prefix)).unwrap_or_else(|| {
                format!("{}/api/auth/oauth/{}/callback", callback_base, provider)
            });
            Some(ProviderCredentials {
                client_id,
                client_secret,
                callback_url,
            })
        };

        Ok(Self {
            host,
            port,
            environment,
            jwt_secret: var("JWT_SECRET"),
            jwt_lifetime_secs,
            jwt_algorithm,
            frontend_url: var("FRONTEND_URL").unwrap_or(default.frontend_url),
            google: credentials(OAuthProvider::Google),
            github: credentials(OAuthProvider::GitHub),
            sessions_enabled: var("SESSIONS_ENABLED")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.sessions_enabled),
        })
    }

    /// Whether `APP_ENV` is production.
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Address to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The secret tokens are signed with.
    pub fn signing_secret(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or(DEV_JWT_SECRET)
    }

    /// Requested access token lifetime.
    pub fn jwt_lifetime(&self) -> Duration {
        Duration::try_seconds(self.jwt_lifetime_secs).unwrap_or(Duration::MAX)
    }

    /// Provider configurations for every enabled provider.
    pub fn oauth_configs(&self) -> Vec<OAuthConfig> {
        [
            (OAuthProvider::Google, &self.google),
            (OAuthProvider::GitHub, &self.github),
        ]
        .into_iter()
        .filter_map(|(provider, creds)| {
            creds.as_ref().map(|c| {
                OAuthConfig::new(
                    provider,
                    c.client_id.clone(),
                    c.client_secret.clone(),
                    c.callback_url.clone(),
                )
            })
        })
        .collect()
    }

    /// Validate that all required configuration is present for production.
    ///
    /// In production the signing secret must be set explicitly and be long
    /// enough for HMAC.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        match &self.jwt_secret {
            None => Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string())),
            Some(secret) if secret.len() < MIN_PRODUCTION_SECRET_LEN => {
                Err(ConfigError::InvalidValue {
                    key: "JWT_SECRET".to_string(),
                    message: format!("must be at least {} bytes", MIN_PRODUCTION_SECRET_LEN),
                })
            }
            Some(_) => Ok(()),
        }
    }
}

/// Parse a lifetime such as `30d` or `12h`.
pub fn parse_lifetime(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let unit = raw.chars().last()?;
    let amount: i64 = raw[..raw.len() - unit.len_utf8()].parse().ok()?;
    if amount <= 0 {
        return None;
    }
    match unit {
        'd' => Duration::try_days(amount),
        'h' => Duration::try_hours(amount),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.jwt_lifetime(), Duration::days(30));
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.signing_secret(), DEV_JWT_SECRET);
        assert!(config.sessions_enabled);
        assert!(config.oauth_configs().is_empty());
    }

    #[test]
    fn test_parse_lifetime() {
        assert_eq!(parse_lifetime("30d"), Some(Duration::days(30)));
        assert_eq!(parse_lifetime(" 12h "), Some(Duration::hours(12)));
        assert_eq!(parse_lifetime("30"), None);
        assert_eq!(parse_lifetime("0d"), None);
        assert_eq!(parse_lifetime("d"), None);
        assert_eq!(parse_lifetime(""), None);
        assert_eq!(parse_lifetime("9999999999999999d"), None);
        assert_eq!(parse_lifetime("9999999999999999h"), None);
    }

    #[test]
    fn test_out_of_range_lifetime_is_a_config_error() {
        let result = from_pairs(&[("JWT_EXPIRE", "9999999999999999d")]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "JWT_EXPIRE"
        ));
    }

    #[test]
    fn test_jwt_algorithm() {
        assert_eq!(from_pairs(&[]).unwrap().jwt_algorithm, JwtAlgorithm::HS256);
        assert_eq!(
            from_pairs(&[("JWT_ALGORITHM", "hs512")]).unwrap().jwt_algorithm,
            JwtAlgorithm::HS512
        );
        assert!(matches!(
            from_pairs(&[("JWT_ALGORITHM", "none")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            from_pairs(&[("PORT", "http")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            from_pairs(&[("JWT_EXPIRE", "forever")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            from_pairs(&[("APP_ENV", "staging")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_provider_needs_id_and_secret() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("GITHUB_CLIENT_ID", "gh-id"),
            ("GITHUB_CLIENT_SECRET", "gh-secret"),
            ("GOOGLE_CLIENT_ID", "g-id"),
        ])
        .unwrap();

        assert!(config.google.is_none());
        let configs = config.oauth_configs();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].provider, OAuthProvider::GitHub);
        assert_eq!(
            configs[0].redirect_url,
            "http://localhost:8080/api/auth/oauth/github/callback"
        );
    }

    #[test]
    fn test_validate_for_production() {
        let config = from_pairs(&[("APP_ENV", "production")]).unwrap();
        assert!(config.is_production());
        assert!(matches!(
            config.validate_for_production(),
            Err(ConfigError::MissingEnvVar(_))
        ));

        let short = from_pairs(&[("APP_ENV", "production"), ("JWT_SECRET", "short")]).unwrap();
        assert!(short.validate_for_production().is_err());

        let secret = "s".repeat(MIN_PRODUCTION_SECRET_LEN);
        let ok = from_pairs(&[("APP_ENV", "production"), ("JWT_SECRET", &secret)]).unwrap();
        assert!(ok.validate_for_production().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = from_pairs(&[
            ("JWT_SECRET", "super-secret-value"),
            ("GOOGLE_CLIENT_ID", "g-id"),
            ("GOOGLE_CLIENT_SECRET", "google-secret-value"),
        ])
        .unwrap();
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("google-secret-value"));
        assert!(rendered.contains("g-id"));
    }
}
