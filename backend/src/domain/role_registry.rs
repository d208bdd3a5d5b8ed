//! Role registry: lookup and idempotent creation of roles.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::identity_error::{IdentityError, map_store_error};
use crate::domain::ports::{
    CredentialStore, CredentialStoreError, PendingWrite, ROLE_NAME_CONSTRAINT, WriteBatch,
};
use crate::domain::role::{NewRole, Role};

fn is_role_name_race(err: &CredentialStoreError) -> bool {
    matches!(
        err,
        CredentialStoreError::UniqueViolation { constraint } if constraint == ROLE_NAME_CONSTRAINT
    )
}

/// Named role lookup and creation over a [`CredentialStore`].
pub struct RoleRegistry<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for RoleRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> RoleRegistry<S>
where
    S: CredentialStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch a role by exact, case-sensitive name. `None` when absent.
    pub async fn get_role(&self, name: &str) -> Result<Option<Role>, IdentityError> {
        self.store
            .find_role_by_name(name)
            .await
            .map_err(map_store_error)
    }

    /// Every role, ordered by name.
    pub async fn list_roles(&self) -> Result<Vec<Role>, IdentityError> {
        self.store.list_roles().await.map_err(map_store_error)
    }

    /// Return the named role, creating it when absent.
    ///
    /// An existing role keeps its stored description.
    pub async fn ensure_role(&self, name: &str, description: &str) -> Result<Role, IdentityError> {
        let role = NewRole::try_new(name, description)
            .map_err(|err| IdentityError::invalid(err.to_string()))?;
        let mut roles = self.ensure_roles(vec![role]).await?;
        roles
            .pop()
            .ok_or_else(|| IdentityError::role_not_found(name))
    }

    /// Ensure every role exists, creating the missing ones in one commit.
    ///
    /// Returns the stored roles in input order.
    pub async fn ensure_roles(&self, wanted: Vec<NewRole>) -> Result<Vec<Role>, IdentityError> {
        let mut batch = WriteBatch::new();
        for role in &wanted {
            let existing = self
                .store
                .find_role_by_name(role.name().as_str())
                .await
                .map_err(map_store_error)?;
            if existing.is_none() && !batch.writes().iter().any(|w| stages(w, role)) {
                batch.insert_role(role.clone());
            }
        }

        if batch.is_empty() {
            debug!("all requested roles already exist");
        } else {
            let staged = batch.len();
            match self.store.commit(batch).await {
                Ok(receipt) => info!(created = receipt.roles.len(), "roles created"),
                Err(err) if is_role_name_race(&err) => {
                    debug!(staged, "role created concurrently; re-reading");
                }
                Err(err) => return Err(map_store_error(err)),
            }
        }

        let mut stored = Vec::with_capacity(wanted.len());
        for role in &wanted {
            stored.push(self.resolve_after_race(role).await?);
        }
        Ok(stored)
    }

    async fn resolve_after_race(&self, role: &NewRole) -> Result<Role, IdentityError> {
        let name = role.name().as_str();
        if let Some(found) = self
            .store
            .find_role_by_name(name)
            .await
            .map_err(map_store_error)?
        {
            return Ok(found);
        }
        // A concurrent writer may have won one name while ours rolled back.
        let mut batch = WriteBatch::new();
        batch.insert_role(role.clone());
        match self.store.commit(batch).await {
            Ok(mut receipt) => receipt
                .roles
                .pop()
                .ok_or_else(|| IdentityError::role_not_found(name)),
            Err(err) if is_role_name_race(&err) => self
                .get_role(name)
                .await?
                .ok_or_else(|| IdentityError::role_not_found(name)),
            Err(err) => Err(map_store_error(err)),
        }
    }
}

fn stages(write: &PendingWrite, role: &NewRole) -> bool {
    matches!(write, PendingWrite::InsertRole(staged) if staged.name() == role.name())
}
