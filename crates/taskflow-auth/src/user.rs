//! User records
//!
//! [`User`] is the full record owned by the credential store, password hash
//! included. [`UserInfo`] is the projection that leaves the server.

use crate::oauth::OAuthProvider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an account was first created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountProvider {
    /// Email + password registration
    Local,
    /// First seen through Google sign-in
    Google,
    /// First seen through GitHub sign-in
    #[serde(rename = "github")]
    GitHub,
}

impl AccountProvider {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountProvider::Local => "local",
            AccountProvider::Google => "google",
            AccountProvider::GitHub => "github",
        }
    }
}

impl From<OAuthProvider> for AccountProvider {
    fn from(provider: OAuthProvider) -> Self {
        match provider {
            OAuthProvider::Google => AccountProvider::Google,
            OAuthProvider::GitHub => AccountProvider::GitHub,
        }
    }
}

/// Full user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Normalized with [`normalize_email`]
    pub email: String,
    /// Argon2 PHC string. `None` for accounts that only sign in through a
    /// provider; such accounts can never pass a password login.
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub github_id: Option<String>,
    pub verified: bool,
    pub provider: AccountProvider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// External ID recorded for `provider`, if the account is linked.
    pub fn provider_id(&self, provider: OAuthProvider) -> Option<&str> {
        match provider {
            OAuthProvider::Google => self.google_id.as_deref(),
            OAuthProvider::GitHub => self.github_id.as_deref(),
        }
    }

    /// Link an external provider ID to this account.
    pub fn link_provider(&mut self, provider: OAuthProvider, external_id: impl Into<String>) {
        let external_id = Some(external_id.into());
        match provider {
            OAuthProvider::Google => self.google_id = external_id,
            OAuthProvider::GitHub => self.github_id = external_id,
        }
        self.updated_at = Utc::now();
    }

    /// Whether the account was created through a provider.
    pub fn is_oauth(&self) -> bool {
        self.provider != AccountProvider::Local
    }

    /// Every stored account must be able to sign in somehow.
    pub fn has_credential(&self) -> bool {
        self.password_hash.is_some() || self.google_id.is_some() || self.github_id.is_some()
    }

    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            is_oauth: self.is_oauth(),
            provider: self.provider,
            verified: self.verified,
        }
    }
}

/// Data needed to create a user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub provider: AccountProvider,
    pub external_id: Option<(OAuthProvider, String)>,
    pub verified: bool,
}

impl NewUser {
    /// A locally registered account.
    pub fn local(name: impl Into<String>, email: &str, password_hash: String) -> Self {
        Self {
            name: name.into(),
            email: normalize_email(email),
            password_hash: Some(password_hash),
            provider: AccountProvider::Local,
            external_id: None,
            verified: false,
        }
    }

    /// An account created on first sign-in through `provider`.
    pub fn oauth(
        provider: OAuthProvider,
        external_id: impl Into<String>,
        name: impl Into<String>,
        email: &str,
    ) -> Self {
        Self {
            name: name.into(),
            email: normalize_email(email),
            password_hash: None,
            provider: provider.into(),
            external_id: Some((provider, external_id.into())),
            verified: true,
        }
    }

    /// Materialize the record with a fresh ID and timestamps.
    pub fn into_user(self) -> User {
        let now = Utc::now();
        let mut user = User {
            id: Uuid::now_v7(),
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            google_id: None,
            github_id: None,
            verified: self.verified,
            provider: self.provider,
            created_at: now,
            updated_at: now,
        };
        if let Some((provider, external_id)) = self.external_id {
            user.link_provider(provider, external_id);
            user.updated_at = now;
        }
        user
    }
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "isOAuth")]
    pub is_oauth: bool,
    pub provider: AccountProvider,
    pub verified: bool,
}

/// Canonical form used for storage and lookups: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
