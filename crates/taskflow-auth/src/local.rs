//! Email + password accounts.

use crate::error::{AuthError, AuthResult};
use crate::password::{hash_password, verify_password};
use crate::store::CredentialStore;
use crate::user::{normalize_email, NewUser, User};
use std::sync::Arc;
use tracing::debug;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Registers and authenticates local accounts against the credential store.
#[derive(Clone)]
pub struct LocalAuthenticator {
    store: Arc<dyn CredentialStore>,
    /// Verified against when the email is unknown, so a miss costs the same
    /// hash computation as a wrong password.
    dummy_hash: Arc<str>,
}

impl LocalAuthenticator {
    pub fn new(store: Arc<dyn CredentialStore>) -> AuthResult<Self> {
        let dummy_hash = hash_password(&uuid::Uuid::now_v7().to_string())?;
        Ok(Self {
            store,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Create a local account. The password is stored as an Argon2 hash.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AuthResult<User> {
        let name = name.trim();
        let email = normalize_email(email);
        validate_registration(name, &email, password)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password(password)?;
        let user = self
            .store
            .create(NewUser::local(name, &email, password_hash))
            .await?;
        debug!(user_id = %user.id, "Registered local account");
        Ok(user)
    }

    /// Check an email + password pair.
    ///
    /// Unknown email, wrong password, and accounts without a local password
    /// all fail with the same [`AuthError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        let user = self.store.find_by_email(email).await?;

        let hash = user
            .as_ref()
            .and_then(|u| u.password_hash.as_deref())
            .unwrap_or(&*self.dummy_hash);
        let matches = verify_password(password, hash)?;

        match user {
            Some(user) if matches && user.password_hash.is_some() => Ok(user),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

fn validate_registration(name: &str, email: &str, password: &str) -> AuthResult<()> {
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AuthError::ValidationFailed(
            "Please provide all fields".to_string(),
        ));
    }
    if !is_plausible_email(email) {
        return Err(AuthError::ValidationFailed(
            "Please provide a valid email".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::ValidationFailed(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
