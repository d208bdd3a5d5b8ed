//! Idempotent creation of the example chef and guest accounts.

use tracing::info;

use crate::domain::ports::{CredentialStore, PasswordHasher};
use crate::domain::{
    CHEF_ROLE, GUEST_ROLE, IdentityError, IdentityService, RoleRegistry, bootstrap,
};
use crate::settings::DatabaseTarget;

/// Shared password of every example account.
pub const EXAMPLE_PASSWORD: &str = "password";

/// One example account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleUser {
    pub email: &'static str,
    pub role: &'static str,
}

/// Accounts created by `make-users`.
pub const EXAMPLE_USERS: [ExampleUser; 2] = [
    ExampleUser {
        email: "mm.ronic@gmail.com",
        role: CHEF_ROLE,
    },
    ExampleUser {
        email: "mm.ronic+guest@gmail.com",
        role: GUEST_ROLE,
    },
];

/// Outcome of a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Baseline roles ensured before seeding.
    pub roles: Vec<String>,
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

/// Seeding target that would lose its rows when the process exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("make-users needs RECIPEAPP_DATABASE_URL; the in-memory store is discarded on exit")]
pub struct EphemeralTarget;

/// Reject targets whose writes would not survive the seeding run.
pub fn require_persistent_target(target: &DatabaseTarget) -> Result<(), EphemeralTarget> {
    match target {
        DatabaseTarget::InMemory => Err(EphemeralTarget),
        DatabaseTarget::Postgres(_) => Ok(()),
    }
}

/// Ensure the baseline roles, then create any missing example account.
///
/// Running it again leaves the store unchanged.
pub async fn seed_example_users<S, H>(
    identity: &IdentityService<S, H>,
    registry: &RoleRegistry<S>,
) -> Result<SeedReport, IdentityError>
where
    S: CredentialStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    let bootstrapped = bootstrap(registry).await?;
    let mut report = SeedReport {
        roles: bootstrapped
            .roles()
            .iter()
            .map(|role| role.name().to_string())
            .collect(),
        ..SeedReport::default()
    };

    for user in EXAMPLE_USERS {
        if identity.is_registered(user.email).await? {
            report.existing.push(user.email.to_owned());
            continue;
        }
        match identity.register(user.email, EXAMPLE_PASSWORD, user.role).await {
            Ok(_) => report.created.push(user.email.to_owned()),
            Err(IdentityError::DuplicateEmail) => report.existing.push(user.email.to_owned()),
            Err(err) => return Err(err),
        }
    }

    info!(
        created = report.created.len(),
        existing = report.existing.len(),
        "example users seeded"
    );
    Ok(report)
}
