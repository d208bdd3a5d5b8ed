//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_store;
mod password_hasher;

#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{
    CommitReceipt, CredentialStore, CredentialStoreError, PendingWrite, ROLE_NAME_CONSTRAINT,
    USER_EMAIL_CONSTRAINT, WriteBatch,
};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{HashError, PasswordHasher};
