//! Provider profile -> local user.

use crate::error::{AuthError, AuthResult};
use crate::oauth::{OAuthProvider, ProviderProfile};
use crate::store::{CredentialStore, OAuthIdentity, OAuthResolution};
use crate::user::User;
use std::sync::Arc;
use tracing::info;

/// Translates a provider identity assertion into a local user record.
///
/// Resolution order: the provider's external ID, then the email (linking the
/// provider ID onto that account), else a new verified account without a
/// local password. Repeated callbacks for one identity return the same user.
#[derive(Clone)]
pub struct OAuthBridge {
    store: Arc<dyn CredentialStore>,
}

impl OAuthBridge {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Resolve `profile` from `provider` to a user, creating one if needed.
    pub async fn handle_callback(
        &self,
        provider: OAuthProvider,
        profile: &ProviderProfile,
    ) -> AuthResult<User> {
        if profile.external_id.trim().is_empty() {
            return Err(AuthError::ProviderError(
                "profile has no provider user ID".to_string(),
            ));
        }
        let email = profile.usable_email().ok_or(AuthError::NoEmail)?;

        let identity = OAuthIdentity {
            provider,
            external_id: profile.external_id.clone(),
            name: profile.name_or(email),
            email: email.to_string(),
        };

        let (user, resolution) = self.store.link_or_create(identity).await?;
        match resolution {
            OAuthResolution::Existing => {}
            OAuthResolution::Linked => {
                info!(user_id = %user.id, provider = %provider, "Linked provider to existing account")
            }
            OAuthResolution::Created => {
                info!(user_id = %user.id, provider = %provider, "Created account from provider profile")
            }
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::ProfileEmail;
    use crate::store::MemoryCredentialStore;
    use crate::user::{AccountProvider, NewUser};

    fn github_profile(id: &str, emails: Vec<ProfileEmail>) -> ProviderProfile {
        ProviderProfile {
            external_id: id.to_string(),
            display_name: None,
            username: Some("annhub".to_string()),
            emails,
        }
    }

    fn verified(value: &str, primary: bool) -> ProfileEmail {
        ProfileEmail {
            value: value.to_string(),
            primary,
            verified: true,
        }
    }

    #[tokio::test]
    async fn test_creates_oauth_user() {
        let store = Arc::new(MemoryCredentialStore::new());
        let bridge = OAuthBridge::new(store.clone());

        let profile = github_profile(
            "42",
            vec![verified("other@x.com", false), verified("Ann@X.com", true)],
        );
        let user = bridge.handle_callback(OAuthProvider::GitHub, &profile).await.unwrap();

        assert_eq!(user.email, "ann@x.com");
        assert_eq!(user.name, "annhub");
        assert_eq!(user.github_id.as_deref(), Some("42"));
        assert_eq!(user.provider, AccountProvider::GitHub);
        assert!(user.verified);
        assert!(user.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_repeated_callback_is_idempotent() {
        let store = Arc::new(MemoryCredentialStore::new());
        let bridge = OAuthBridge::new(store.clone());
        let profile = github_profile("42", vec![verified("ann@x.com", true)]);

        let first = bridge.handle_callback(OAuthProvider::GitHub, &profile).await.unwrap();
        let second = bridge.handle_callback(OAuthProvider::GitHub, &profile).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_matches_external_id_after_email_change() {
        let store = Arc::new(MemoryCredentialStore::new());
        let bridge = OAuthBridge::new(store.clone());

        let first = bridge
            .handle_callback(OAuthProvider::GitHub, &github_profile("42", vec![verified("ann@x.com", true)]))
            .await
            .unwrap();
        let second = bridge
            .handle_callback(OAuthProvider::GitHub, &github_profile("42", vec![verified("ann@new.com", true)]))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_links_local_account_by_email() {
        let store = Arc::new(MemoryCredentialStore::new());
        let local = store
            .create(NewUser::local("Ann", "ann@x.com", "$argon2id$hash".into()))
            .await
            .unwrap();
        let bridge = OAuthBridge::new(store.clone());

        let profile = ProviderProfile {
            external_id: "g-7".to_string(),
            display_name: Some("Ann G".to_string()),
            username: None,
            emails: vec![verified("ann@x.com", true)],
        };
        let user = bridge.handle_callback(OAuthProvider::Google, &profile).await.unwrap();

        assert_eq!(user.id, local.id);
        assert_eq!(user.name, "Ann");
        assert_eq!(user.google_id.as_deref(), Some("g-7"));
        assert_eq!(user.password_hash.as_deref(), Some("$argon2id$hash"));
        assert_eq!(user.provider, AccountProvider::Local);
    }

    #[tokio::test]
    async fn test_no_email() {
        let store = Arc::new(MemoryCredentialStore::new());
        let bridge = OAuthBridge::new(store.clone());

        let profile = github_profile("42", vec![]);
        let result = bridge.handle_callback(OAuthProvider::GitHub, &profile).await;

        assert!(matches!(result, Err(AuthError::NoEmail)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_login_creates_one_user() {
        let store = Arc::new(MemoryCredentialStore::new());
        let bridge = OAuthBridge::new(store.clone());
        let profile = github_profile("42", vec![verified("ann@x.com", true)]);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let bridge = bridge.clone();
                let profile = profile.clone();
                tokio::spawn(async move {
                    bridge.handle_callback(OAuthProvider::GitHub, &profile).await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
