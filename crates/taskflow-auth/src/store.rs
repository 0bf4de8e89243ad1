//! Credential store
//!
//! The store exclusively owns user records. [`CredentialStore`] is the seam
//! for a persistent backend; [`MemoryCredentialStore`] is the in-process
//! implementation used by the server and the tests.

use crate::error::{AuthError, AuthResult};
use crate::oauth::OAuthProvider;
use crate::user::{normalize_email, NewUser, User};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A provider-asserted identity, ready to be matched against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    pub provider: OAuthProvider,
    pub external_id: String,
    pub name: String,
    pub email: String,
}

/// How [`CredentialStore::link_or_create`] resolved an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthResolution {
    /// A user already carried this provider ID
    Existing,
    /// A user with the same email gained this provider ID
    Linked,
    /// No match; a new user was created
    Created,
}

/// Persistence for user records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by email (compared after normalization).
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Look up a user by ID.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// Look up a user by the ID a provider assigned to them.
    async fn find_by_provider_id(
        &self,
        provider: OAuthProvider,
        external_id: &str,
    ) -> AuthResult<Option<User>>;

    /// Insert a new user. Fails with [`AuthError::DuplicateEmail`] when the
    /// email is taken.
    async fn create(&self, user: NewUser) -> AuthResult<User>;

    /// Persist changes to an existing user.
    async fn save(&self, user: &User) -> AuthResult<()>;

    /// Atomically resolve a provider identity to a user: match by provider
    /// ID, else by email (linking the provider ID), else create.
    ///
    /// Concurrent calls for the same identity must yield one record.
    async fn link_or_create(&self, identity: OAuthIdentity) -> AuthResult<(User, OAuthResolution)>;

    /// Number of stored users.
    async fn count(&self) -> AuthResult<usize>;
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

impl Inner {
    fn by_email(&self, email: &str) -> Option<&User> {
        self.by_email
            .get(&normalize_email(email))
            .and_then(|id| self.users.get(id))
    }

    fn by_provider_id(&self, provider: OAuthProvider, external_id: &str) -> Option<&User> {
        self.users
            .values()
            .find(|user| user.provider_id(provider) == Some(external_id))
    }

    fn insert(&mut self, new_user: NewUser) -> AuthResult<User> {
        if self.by_email.contains_key(&new_user.email) {
            return Err(AuthError::DuplicateEmail);
        }
        let user = new_user.into_user();
        if !user.has_credential() {
            return Err(AuthError::ValidationFailed(
                "user needs a password or a provider identity".to_string(),
            ));
        }
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self.inner.read().await.by_email(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_provider_id(
        &self,
        provider: OAuthProvider,
        external_id: &str,
    ) -> AuthResult<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .by_provider_id(provider, external_id)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> AuthResult<User> {
        self.inner.write().await.insert(user)
    }

    async fn save(&self, user: &User) -> AuthResult<()> {
        let mut inner = self.inner.write().await;
        let previous_email = match inner.users.get(&user.id) {
            Some(existing) => existing.email.clone(),
            None => return Err(AuthError::NotFound),
        };

        let email = normalize_email(&user.email);
        if email != previous_email {
            if inner.by_email.contains_key(&email) {
                return Err(AuthError::DuplicateEmail);
            }
            inner.by_email.remove(&previous_email);
            inner.by_email.insert(email.clone(), user.id);
        }

        let mut updated = user.clone();
        updated.email = email;
        inner.users.insert(updated.id, updated);
        Ok(())
    }

    async fn link_or_create(&self, identity: OAuthIdentity) -> AuthResult<(User, OAuthResolution)> {
        // One write lock across lookup and insert keeps find-or-create atomic.
        let mut inner = self.inner.write().await;

        if let Some(user) = inner.by_provider_id(identity.provider, &identity.external_id) {
            return Ok((user.clone(), OAuthResolution::Existing));
        }

        if let Some(existing) = inner.by_email(&identity.email).cloned() {
            if existing.provider_id(identity.provider).is_some() {
                return Err(AuthError::ProviderError(format!(
                    "{} is linked to a different {} account",
                    existing.email,
                    identity.provider.as_str()
                )));
            }
            let mut user = existing;
            user.link_provider(identity.provider, identity.external_id);
            inner.users.insert(user.id, user.clone());
            return Ok((user, OAuthResolution::Linked));
        }

        let user = inner.insert(NewUser::oauth(
            identity.provider,
            identity.external_id,
            identity.name,
            &identity.email,
        ))?;
        Ok((user, OAuthResolution::Created))
    }

    async fn count(&self) -> AuthResult<usize> {
        Ok(self.inner.read().await.users.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(external_id: &str, email: &str) -> OAuthIdentity {
        OAuthIdentity {
            provider: OAuthProvider::Google,
            external_id: external_id.to_string(),
            name: "Ann".to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryCredentialStore::new();
        let user = store
            .create(NewUser::local("Ann", "Ann@X.com", "$argon2id$fake".into()))
            .await
            .unwrap();

        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(store.find_by_email("ann@x.com").await.unwrap(), Some(user.clone()));
        assert_eq!(store.find_by_email(" ANN@x.com").await.unwrap(), Some(user));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = MemoryCredentialStore::new();
        store
            .create(NewUser::local("Ann", "ann@x.com", "$argon2id$a".into()))
            .await
            .unwrap();
        let result = store
            .create(NewUser::local("Other Ann", "ANN@x.com", "$argon2id$b".into()))
            .await;

        assert!(matches!(result, Err(AuthError::DuplicateEmail)));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_unknown_user() {
        let store = MemoryCredentialStore::new();
        let user = NewUser::local("Ann", "ann@x.com", "$argon2id$a".into()).into_user();

        assert!(matches!(store.save(&user).await, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn test_save_updates_email_index() {
        let store = MemoryCredentialStore::new();
        let mut user = store
            .create(NewUser::local("Ann", "ann@x.com", "$argon2id$a".into()))
            .await
            .unwrap();

        user.email = "ann@y.com".into();
        store.save(&user).await.unwrap();

        assert!(store.find_by_email("ann@x.com").await.unwrap().is_none());
        assert!(store.find_by_email("ann@y.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_link_or_create_resolution_order() {
        let store = MemoryCredentialStore::new();

        let (created, resolution) = store.link_or_create(identity("g-1", "ann@x.com")).await.unwrap();
        assert_eq!(resolution, OAuthResolution::Created);

        let (again, resolution) = store.link_or_create(identity("g-1", "ann@x.com")).await.unwrap();
        assert_eq!(resolution, OAuthResolution::Existing);
        assert_eq!(again.id, created.id);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_link_by_email_keeps_password() {
        let store = MemoryCredentialStore::new();
        let local = store
            .create(NewUser::local("Ann", "ann@x.com", "$argon2id$a".into()))
            .await
            .unwrap();

        let (linked, resolution) = store.link_or_create(identity("g-1", "ANN@x.com")).await.unwrap();

        assert_eq!(resolution, OAuthResolution::Linked);
        assert_eq!(linked.id, local.id);
        assert_eq!(linked.google_id.as_deref(), Some("g-1"));
        assert_eq!(linked.password_hash, local.password_hash);
        assert_eq!(
            store.find_by_provider_id(OAuthProvider::Google, "g-1").await.unwrap(),
            Some(linked)
        );
    }

    #[tokio::test]
    async fn test_refuses_to_relink_provider() {
        let store = MemoryCredentialStore::new();
        store.link_or_create(identity("g-1", "ann@x.com")).await.unwrap();

        let result = store.link_or_create(identity("g-2", "ann@x.com")).await;
        assert!(matches!(result, Err(AuthError::ProviderError(_))));
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
