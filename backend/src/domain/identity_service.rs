//! Identity service: registration, authentication and identity lookups.
//!
//! Orchestrates the [`CredentialStore`] and [`PasswordHasher`] ports. Emails
//! are logged; passwords and hashes never are.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::domain::auth::Credentials;
use crate::domain::capabilities;
use crate::domain::identity_error::{IdentityError, map_store_error};
use crate::domain::ports::{CredentialStore, PasswordHasher, WriteBatch};
use crate::domain::role::RoleId;
use crate::domain::user::{EmailAddress, LoginEvent, NewUser, PasswordHash, User, UserId};

/// Behaviour switches for [`IdentityService`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityOptions {
    /// Create users without a role when the requested role is unknown.
    pub allow_roleless_registration: bool,
}

/// Registration and login use-cases.
pub struct IdentityService<S: ?Sized, H: ?Sized> {
    store: Arc<S>,
    hasher: Arc<H>,
    options: IdentityOptions,
    decoy_hash: Arc<OnceCell<PasswordHash>>,
}

impl<S: ?Sized, H: ?Sized> Clone for IdentityService<S, H> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hasher: Arc::clone(&self.hasher),
            options: self.options,
            decoy_hash: Arc::clone(&self.decoy_hash),
        }
    }
}

impl<S, H> IdentityService<S, H>
where
    S: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    pub fn new(store: Arc<S>, hasher: Arc<H>, options: IdentityOptions) -> Self {
        Self {
            store,
            hasher,
            options,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Create an active user holding `role_name`.
    ///
    /// The pre-check reports [`IdentityError::DuplicateEmail`] for known
    /// emails; the store's email constraint reports the same error when a
    /// concurrent registration wins the race.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role_name: &str,
    ) -> Result<User, IdentityError> {
        let credentials = Credentials::try_from_parts(email, password)
            .map_err(|err| IdentityError::invalid(err.to_string()))?;
        let email = credentials.email().clone();

        if self.is_registered_email(&email).await? {
            debug!(%email, "registration rejected: email already registered");
            return Err(IdentityError::DuplicateEmail);
        }

        let role_ids = self.resolve_role(role_name, &email).await?;
        let password_hash = self.hasher.hash(credentials.password()).await.map_err(|err| {
            IdentityError::Hashing {
                message: err.to_string(),
            }
        })?;

        let mut batch = WriteBatch::new();
        batch.insert_user(NewUser::new(email.clone(), password_hash, role_ids));
        let mut receipt = self.store.commit(batch).await.map_err(|err| {
            let mapped = map_store_error(err);
            if mapped == IdentityError::DuplicateEmail {
                debug!(%email, "registration lost a concurrent race");
            }
            mapped
        })?;

        let user = receipt.users.pop().ok_or_else(|| IdentityError::Storage {
            message: "commit returned no user".to_owned(),
        })?;
        info!(%email, user_id = %user.id(), role = role_name, "user registered");
        Ok(user)
    }

    async fn resolve_role(
        &self,
        role_name: &str,
        email: &EmailAddress,
    ) -> Result<Vec<RoleId>, IdentityError> {
        let role = self
            .store
            .find_role_by_name(role_name)
            .await
            .map_err(map_store_error)?;
        match role {
            Some(role) => Ok(vec![role.id()]),
            None if self.options.allow_roleless_registration => {
                warn!(%email, role = role_name, "unknown role; registering without a role");
                Ok(Vec::new())
            }
            None => Err(IdentityError::role_not_found(role_name)),
        }
    }

    /// Check an email/password pair and record the login.
    ///
    /// Unknown emails, wrong passwords, unreadable hashes and inactive
    /// accounts are indistinguishable to the caller.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        client_ip: Option<IpAddr>,
    ) -> Result<User, IdentityError> {
        let Ok(credentials) = Credentials::try_from_parts(email, password) else {
            self.decoy_verify(password).await;
            return Err(IdentityError::AuthFailure);
        };

        let found = self
            .store
            .find_user_by_email(credentials.email())
            .await
            .map_err(map_store_error)?;
        let Some(mut user) = found else {
            self.decoy_verify(credentials.password()).await;
            debug!(email = %credentials.email(), "login failed");
            return Err(IdentityError::AuthFailure);
        };

        let verified = self
            .hasher
            .verify(credentials.password(), user.password_hash())
            .await;
        if !verified || !capabilities::is_active(&user) {
            debug!(email = %credentials.email(), "login failed");
            return Err(IdentityError::AuthFailure);
        }

        let event = LoginEvent::now(client_ip);
        self.store
            .record_login(user.id(), &event)
            .await
            .map_err(map_store_error)?;
        user.record_login(&event);
        info!(email = %credentials.email(), user_id = %user.id(), "user logged in");
        Ok(user)
    }

    /// Spend the same hashing effort as a real check so timing stays uniform.
    async fn decoy_verify(&self, password: &str) {
        let hasher = &self.hasher;
        let decoy = self
            .decoy_hash
            .get_or_try_init(|| async { hasher.hash("decoy password").await })
            .await;
        match decoy {
            Ok(hash) => {
                let _ = hasher.verify(password, hash).await;
            }
            Err(error) => warn!(%error, "decoy hash unavailable"),
        }
    }

    /// Whether a user with this email exists.
    pub async fn is_registered(&self, email: &str) -> Result<bool, IdentityError> {
        let Ok(email) = EmailAddress::new(email) else {
            return Ok(false);
        };
        self.is_registered_email(&email).await
    }

    async fn is_registered_email(&self, email: &EmailAddress) -> Result<bool, IdentityError> {
        self.store
            .find_user_by_email(email)
            .await
            .map(|user| user.is_some())
            .map_err(map_store_error)
    }

    /// Load a user by identifier.
    pub async fn find_user(&self, id: UserId) -> Result<Option<User>, IdentityError> {
        self.store.find_user_by_id(id).await.map_err(map_store_error)
    }

    /// Resolve a session's user, treating deactivated accounts as absent.
    pub async fn find_active_user(&self, id: UserId) -> Result<Option<User>, IdentityError> {
        Ok(self.find_user(id).await?.filter(capabilities::is_active))
    }

    /// Activate or deactivate an account.
    pub async fn set_active(&self, id: UserId, active: bool) -> Result<(), IdentityError> {
        let updated = self
            .store
            .set_user_active(id, active)
            .await
            .map_err(map_store_error)?;
        if !updated {
            return Err(IdentityError::invalid(format!("unknown user {id}")));
        }
        info!(user_id = %id, active, "user activation changed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "identity_service_tests.rs"]
mod tests;
