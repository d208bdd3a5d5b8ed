//! Assembly of the identity stack from runtime settings.
//!
//! Both the HTTP server and the `make-users` command start from an
//! [`IdentityStack`], so they share store selection, migrations and hashing.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{CredentialStore, CredentialStoreError, PasswordHasher};
use crate::domain::{IdentityOptions, IdentityService, RoleRegistry};
use crate::inbound::http::state::SharedIdentityService;
use crate::outbound::crypto::{BcryptPasswordHasher, CostOutOfRange};
use crate::outbound::persistence::{
    DbPool, DieselCredentialStore, InMemoryCredentialStore, PoolConfig, PoolError,
    run_pending_migrations,
};
use crate::settings::{DatabaseTarget, RuntimeSettings};

/// Failures while assembling the identity stack.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Cost(#[from] CostOutOfRange),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("database migrations failed: {0}")]
    Migrations(#[from] CredentialStoreError),
}

/// Identity use-cases wired to one credential store and hasher.
#[derive(Clone)]
pub struct IdentityStack {
    pub identity: SharedIdentityService,
    pub registry: RoleRegistry<dyn CredentialStore>,
}

impl IdentityStack {
    /// Select the store named by the settings, migrating PostgreSQL first.
    pub async fn from_settings(settings: &RuntimeSettings) -> Result<Self, StartupError> {
        let hasher = BcryptPasswordHasher::new(settings.bcrypt_cost)?;
        let options = IdentityOptions {
            allow_roleless_registration: settings.allow_roleless_registration,
        };
        let store: Arc<dyn CredentialStore> = match &settings.database {
            DatabaseTarget::InMemory => {
                info!("using in-memory credential store");
                Arc::new(InMemoryCredentialStore::new())
            }
            DatabaseTarget::Postgres(url) => {
                run_pending_migrations(url).await?;
                let pool = DbPool::new(PoolConfig::new(url.as_str())).await?;
                info!("using PostgreSQL credential store");
                Arc::new(DieselCredentialStore::new(pool))
            }
        };
        Ok(Self::assemble(store, Arc::new(hasher), options))
    }

    /// Stack over an empty in-memory store.
    pub fn in_memory(cost: u32, options: IdentityOptions) -> Result<Self, StartupError> {
        let hasher = BcryptPasswordHasher::new(cost)?;
        Ok(Self::assemble(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(hasher),
            options,
        ))
    }

    fn assemble(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        options: IdentityOptions,
    ) -> Self {
        Self {
            identity: IdentityService::new(Arc::clone(&store), hasher, options),
            registry: RoleRegistry::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bootstrap;
    use crate::outbound::crypto::MIN_COST;
    use crate::settings::AppSettings;
    use rstest::rstest;

    #[rstest]
    fn invalid_cost_is_rejected() {
        let err = IdentityStack::in_memory(2, IdentityOptions::default())
            .err()
            .expect("cost below minimum");
        assert!(matches!(err, StartupError::Cost(CostOutOfRange(2))));
    }

    #[rstest]
    #[tokio::test]
    async fn memory_url_selects_in_memory_store() {
        let settings = AppSettings {
            environment: Some("development".to_owned()),
            database_url: Some("memory://".to_owned()),
            bcrypt_cost: Some(MIN_COST),
            ..AppSettings::default()
        }
        .resolve()
        .expect("valid settings");
        let stack = IdentityStack::from_settings(&settings)
            .await
            .expect("stack builds");

        let token = bootstrap(&stack.registry).await.expect("bootstrap");
        assert_eq!(token.roles().len(), 2);
        let user = stack
            .identity
            .register("cook@x.com", "pw", "chef")
            .await
            .expect("register");
        assert_eq!(user.roles().len(), 1);
    }
}
