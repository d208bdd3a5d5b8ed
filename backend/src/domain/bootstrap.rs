//! Startup role bootstrap.
//!
//! The HTTP server only accepts a [`Bootstrapped`] token, so it cannot be
//! built before the baseline roles exist.

use tracing::info;

use crate::domain::identity_error::IdentityError;
use crate::domain::ports::CredentialStore;
use crate::domain::role::{Role, baseline_roles};
use crate::domain::role_registry::RoleRegistry;

/// Proof that the baseline roles exist in the store.
#[must_use = "the server requires the bootstrap token"]
#[derive(Debug, Clone)]
pub struct Bootstrapped {
    roles: Vec<Role>,
}

impl Bootstrapped {
    /// Baseline roles as stored, `chef` then `guest`.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

/// Ensure `chef` and `guest` exist. Safe to run repeatedly.
pub async fn bootstrap<S>(registry: &RoleRegistry<S>) -> Result<Bootstrapped, IdentityError>
where
    S: CredentialStore + ?Sized,
{
    let roles = registry.ensure_roles(baseline_roles().to_vec()).await?;
    info!(roles = roles.len(), "baseline roles ready");
    Ok(Bootstrapped { roles })
}
