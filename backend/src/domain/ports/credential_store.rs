//! Port abstraction for role and user persistence.
//!
//! Writes are staged in a [`WriteBatch`] and applied by
//! [`CredentialStore::commit`] as one atomic unit: either every pending
//! write becomes visible or none does.

use async_trait::async_trait;

use crate::domain::role::{NewRole, Role};
use crate::domain::user::{EmailAddress, LoginEvent, NewUser, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by credential store adapters.
    pub enum CredentialStoreError {
        /// Store could not be reached or the connection dropped.
        Connection { message: String } => "credential store connection failed: {message}" as transient,
        /// Query or mutation failed during execution.
        Query { message: String } => "credential store query failed: {message}",
        /// A uniqueness constraint rejected the write.
        UniqueViolation { constraint: String } => "unique constraint violated: {constraint}",
    }
}

/// Constraint guarding unique user emails.
pub const USER_EMAIL_CONSTRAINT: &str = "users_email_key";
/// Constraint guarding unique role names.
pub const ROLE_NAME_CONSTRAINT: &str = "roles_name_key";

/// One staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    InsertRole(NewRole),
    InsertUser(NewUser),
}

/// Ordered set of writes applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<PendingWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a role insert.
    pub fn insert_role(&mut self, role: NewRole) -> &mut Self {
        self.writes.push(PendingWrite::InsertRole(role));
        self
    }

    /// Stage a user insert along with its role links.
    pub fn insert_user(&mut self, user: NewUser) -> &mut Self {
        self.writes.push(PendingWrite::InsertUser(user));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn writes(&self) -> &[PendingWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<PendingWrite> {
        self.writes
    }
}

/// Records created by a successful commit, in staging order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub roles: Vec<Role>,
    pub users: Vec<User>,
}

/// Durable storage for roles, users and their links.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a role by exact name.
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, CredentialStoreError>;

    /// All roles ordered by name.
    async fn list_roles(&self) -> Result<Vec<Role>, CredentialStoreError>;

    /// Look up a user, with roles loaded, by exact email.
    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, CredentialStoreError>;

    /// Look up a user, with roles loaded, by identifier.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, CredentialStoreError>;

    /// Apply every staged write atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, CredentialStoreError>;

    /// Rotate login telemetry for an existing user.
    async fn record_login(&self, id: UserId, event: &LoginEvent)
    -> Result<(), CredentialStoreError>;

    /// Activate or deactivate a user. Returns `false` when no such user exists.
    async fn set_user_active(&self, id: UserId, active: bool)
    -> Result<bool, CredentialStoreError>;
}
