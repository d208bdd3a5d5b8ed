//! Process-local credential store.
//!
//! Used for development runs without a database and by the test suites.
//! Commits stage every write against a copy of the state and swap it in only
//! when the whole batch succeeds, mirroring a database transaction.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{
    CommitReceipt, CredentialStore, CredentialStoreError, PendingWrite, ROLE_NAME_CONSTRAINT,
    USER_EMAIL_CONSTRAINT, WriteBatch,
};
use crate::domain::{EmailAddress, LoginEvent, Role, RoleId, User, UserId};

#[derive(Debug, Clone, Default)]
struct StoreState {
    roles: BTreeMap<RoleId, Role>,
    users: BTreeMap<UserId, User>,
    next_role_id: i32,
    next_user_id: i32,
}

impl StoreState {
    fn role_named(&self, name: &str) -> Option<&Role> {
        self.roles.values().find(|role| role.name().as_str() == name)
    }

    fn user_with_email(&self, email: &EmailAddress) -> Option<&User> {
        self.users.values().find(|user| user.email() == email)
    }

    fn apply(
        &mut self,
        write: PendingWrite,
        receipt: &mut CommitReceipt,
    ) -> Result<(), CredentialStoreError> {
        match write {
            PendingWrite::InsertRole(role) => {
                if self.role_named(role.name().as_str()).is_some() {
                    return Err(CredentialStoreError::unique_violation(ROLE_NAME_CONSTRAINT));
                }
                self.next_role_id += 1;
                let stored = role.into_role(RoleId::new(self.next_role_id));
                self.roles.insert(stored.id(), stored.clone());
                receipt.roles.push(stored);
            }
            PendingWrite::InsertUser(user) => {
                if self.user_with_email(user.email()).is_some() {
                    return Err(CredentialStoreError::unique_violation(USER_EMAIL_CONSTRAINT));
                }
                let mut roles = user
                    .role_ids()
                    .iter()
                    .map(|id| {
                        self.roles.get(id).cloned().ok_or_else(|| {
                            CredentialStoreError::query(format!("role {id} does not exist"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                roles.sort_by(|a, b| a.name().cmp(b.name()));
                roles.dedup_by_key(|role| role.id());
                self.next_user_id += 1;
                let stored = user.into_user(UserId::new(self.next_user_id), roles);
                self.users.insert(stored.id(), stored.clone());
                receipt.users.push(stored);
            }
        }
        Ok(())
    }
}

/// In-memory implementation of [`CredentialStore`].
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    state: RwLock<StoreState>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, CredentialStoreError> {
        Ok(self.state.read().await.role_named(name).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, CredentialStoreError> {
        let mut roles: Vec<Role> = self.state.read().await.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(roles)
    }

    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, CredentialStoreError> {
        Ok(self.state.read().await.user_with_email(email).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, CredentialStoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, CredentialStoreError> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        let mut receipt = CommitReceipt::default();
        for write in batch.into_writes() {
            staged.apply(write, &mut receipt)?;
        }
        *state = staged;
        debug!(
            roles = receipt.roles.len(),
            users = receipt.users.len(),
            "in-memory batch committed"
        );
        Ok(receipt)
    }

    async fn record_login(&self, id: UserId, event: &LoginEvent) -> Result<(), CredentialStoreError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| CredentialStoreError::query(format!("user {id} not found")))?;
        user.record_login(event);
        Ok(())
    }

    async fn set_user_active(&self, id: UserId, active: bool) -> Result<bool, CredentialStoreError> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(false);
        };
        user.set_active(active);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{NewRole, NewUser, PasswordHash};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::new()
    }

    fn new_user(email: &str, role_ids: Vec<RoleId>) -> NewUser {
        NewUser::new(
            EmailAddress::new(email).expect("valid email"),
            PasswordHash::from_encoded("$2b$04$hash"),
            role_ids,
        )
    }

    async fn seed_roles(store: &InMemoryCredentialStore) -> CommitReceipt {
        let mut batch = WriteBatch::new();
        batch.insert_role(NewRole::guest()).insert_role(NewRole::chef());
        store.commit(batch).await.expect("roles committed")
    }

    #[rstest]
    #[tokio::test]
    async fn roles_are_listed_by_name(store: InMemoryCredentialStore) {
        seed_roles(&store).await;
        let names: Vec<String> = store
            .list_roles()
            .await
            .expect("list roles")
            .iter()
            .map(|role| role.name().to_string())
            .collect();
        assert_eq!(names, vec!["chef", "guest"]);
    }

    #[rstest]
    #[tokio::test]
    async fn batch_with_duplicate_role_leaves_nothing_behind(store: InMemoryCredentialStore) {
        let mut batch = WriteBatch::new();
        batch
            .insert_role(NewRole::try_new("baker", "Bakes.").expect("valid role"))
            .insert_role(NewRole::chef())
            .insert_role(NewRole::chef());

        let err = store.commit(batch).await.expect_err("duplicate role name");
        assert_eq!(err, CredentialStoreError::unique_violation(ROLE_NAME_CONSTRAINT));
        assert!(store.list_roles().await.expect("list roles").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_reports_email_constraint(store: InMemoryCredentialStore) {
        let mut first = WriteBatch::new();
        first.insert_user(new_user("a@x.com", Vec::new()));
        store.commit(first).await.expect("first user");

        let mut second = WriteBatch::new();
        second.insert_user(new_user("a@x.com", Vec::new()));
        let err = store.commit(second).await.expect_err("duplicate email");
        assert_eq!(err, CredentialStoreError::unique_violation(USER_EMAIL_CONSTRAINT));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_role_link_is_rejected(store: InMemoryCredentialStore) {
        let mut batch = WriteBatch::new();
        batch.insert_user(new_user("a@x.com", vec![RoleId::new(99)]));
        let err = store.commit(batch).await.expect_err("missing role");
        assert!(matches!(err, CredentialStoreError::Query { .. }));
        let email = EmailAddress::new("a@x.com").expect("valid email");
        assert!(store.find_user_by_email(&email).await.expect("lookup").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn users_load_with_roles(store: InMemoryCredentialStore) {
        let receipt = seed_roles(&store).await;
        let ids = receipt.roles.iter().map(Role::id).collect();
        let mut batch = WriteBatch::new();
        batch.insert_user(new_user("a@x.com", ids));
        let created = store.commit(batch).await.expect("user created");
        let id = created.users.first().expect("one user").id();

        let loaded = store
            .find_user_by_id(id)
            .await
            .expect("lookup")
            .expect("user exists");
        let names: Vec<&str> = loaded.roles().iter().map(|r| r.name().as_str()).collect();
        assert_eq!(names, vec!["chef", "guest"]);
    }

    #[rstest]
    #[tokio::test]
    async fn record_login_rotates_telemetry(store: InMemoryCredentialStore) {
        let mut batch = WriteBatch::new();
        batch.insert_user(new_user("a@x.com", Vec::new()));
        let id = store
            .commit(batch)
            .await
            .expect("user created")
            .users
            .first()
            .expect("one user")
            .id();

        let first = LoginEvent::now(Some("10.0.0.1".parse().expect("ip")));
        let second = LoginEvent::now(Some("10.0.0.2".parse().expect("ip")));
        store.record_login(id, &first).await.expect("first login");
        store.record_login(id, &second).await.expect("second login");

        let user = store.find_user_by_id(id).await.expect("lookup").expect("user");
        assert_eq!(user.telemetry().login_count, 2);
        assert_eq!(user.telemetry().last_login_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(user.telemetry().current_login_ip.as_deref(), Some("10.0.0.2"));
    }

    #[rstest]
    #[tokio::test]
    async fn record_login_for_missing_user_fails(store: InMemoryCredentialStore) {
        let event = LoginEvent::now(None);
        let err = store
            .record_login(UserId::new(42), &event)
            .await
            .expect_err("no such user");
        assert!(matches!(err, CredentialStoreError::Query { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn set_user_active_reports_missing_users(store: InMemoryCredentialStore) {
        assert!(!store.set_user_active(UserId::new(1), false).await.expect("update"));
    }
}
