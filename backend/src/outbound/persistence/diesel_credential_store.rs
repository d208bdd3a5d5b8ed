//! PostgreSQL-backed credential store using Diesel ORM.
//!
//! Commits run inside one database transaction. Uniqueness of role names
//! and user emails is enforced by named constraints, so concurrent writers
//! see a [`CredentialStoreError::UniqueViolation`] carrying the constraint.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    CommitReceipt, CredentialStore, CredentialStoreError, PendingWrite, WriteBatch,
};
use crate::domain::{EmailAddress, LoginEvent, Role, User, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewRoleRow, NewUserRow, RoleLinkRow, RoleRow, UserRow};
use super::pool::DbPool;
use super::schema::{roles, roles_users, users};

/// Diesel-backed implementation of [`CredentialStore`].
#[derive(Clone)]
pub struct DieselCredentialStore {
    pool: DbPool,
}

impl DieselCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn load_user_roles(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> Result<Vec<RoleRow>, diesel::result::Error> {
    roles_users::table
        .inner_join(roles::table)
        .filter(roles_users::user_id.eq(user_id))
        .order(roles::name.asc())
        .select(RoleRow::as_select())
        .load(conn)
        .await
}

/// Rows created inside a commit, converted once the transaction is over.
#[derive(Default)]
struct CommittedRows {
    roles: Vec<RoleRow>,
    users: Vec<(UserRow, Vec<RoleRow>)>,
}

async fn apply_write(
    conn: &mut AsyncPgConnection,
    write: &PendingWrite,
    rows: &mut CommittedRows,
) -> Result<(), diesel::result::Error> {
    match write {
        PendingWrite::InsertRole(role) => {
            let row = diesel::insert_into(roles::table)
                .values(&NewRoleRow {
                    name: role.name().as_str(),
                    description: role.description(),
                })
                .returning(RoleRow::as_returning())
                .get_result(conn)
                .await?;
            rows.roles.push(row);
        }
        PendingWrite::InsertUser(user) => {
            let row = diesel::insert_into(users::table)
                .values(&NewUserRow {
                    email: user.email().as_str(),
                    password_hash: user.password_hash().as_str(),
                })
                .returning(UserRow::as_returning())
                .get_result(conn)
                .await?;
            let links: Vec<RoleLinkRow> = user
                .role_ids()
                .iter()
                .map(|role_id| RoleLinkRow {
                    user_id: row.id,
                    role_id: role_id.get(),
                })
                .collect();
            if !links.is_empty() {
                diesel::insert_into(roles_users::table)
                    .values(&links)
                    .execute(conn)
                    .await?;
            }
            let role_rows = load_user_roles(conn, row.id).await?;
            rows.users.push((row, role_rows));
        }
    }
    Ok(())
}

async fn attach_roles(
    conn: &mut AsyncPgConnection,
    found: Option<UserRow>,
) -> Result<Option<User>, CredentialStoreError> {
    let Some(row) = found else {
        return Ok(None);
    };
    let role_rows = load_user_roles(conn, row.id)
        .await
        .map_err(map_diesel_error)?;
    row.into_user(role_rows).map(Some)
}

#[async_trait]
impl CredentialStore for DieselCredentialStore {
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        roles::table
            .filter(roles::name.eq(name))
            .select(RoleRow::as_select())
            .first::<RoleRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(RoleRow::into_role)
            .transpose()
    }

    async fn list_roles(&self) -> Result<Vec<Role>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RoleRow> = roles::table
            .order(roles::name.asc())
            .select(RoleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(RoleRow::into_role).collect()
    }

    async fn find_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        attach_roles(&mut conn, found).await
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        attach_roles(&mut conn, found).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, CredentialStoreError> {
        if batch.is_empty() {
            return Ok(CommitReceipt::default());
        }
        let writes = batch.into_writes();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows = conn
            .transaction(|conn| {
                async move {
                    let mut rows = CommittedRows::default();
                    for write in &writes {
                        apply_write(conn, write, &mut rows).await?;
                    }
                    Ok::<_, diesel::result::Error>(rows)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        debug!(
            roles = rows.roles.len(),
            users = rows.users.len(),
            "credential batch committed"
        );
        let roles = rows
            .roles
            .into_iter()
            .map(RoleRow::into_role)
            .collect::<Result<Vec<_>, _>>()?;
        let users = rows
            .users
            .into_iter()
            .map(|(row, role_rows)| row.into_user(role_rows))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommitReceipt { roles, users })
    }

    async fn record_login(&self, id: UserId, event: &LoginEvent) -> Result<(), CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Right-hand column references read the pre-update values.
        let updated = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set((
                users::last_login_at.eq(users::current_login_at),
                users::last_login_ip.eq(users::current_login_ip),
                users::current_login_at.eq(Some(event.at)),
                users::current_login_ip.eq(event.ip.map(|ip| ip.to_string())),
                users::login_count.eq(users::login_count + 1),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(CredentialStoreError::query(format!("user {id} not found")));
        }
        Ok(())
    }

    async fn set_user_active(&self, id: UserId, active: bool) -> Result<bool, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.filter(users::id.eq(id.get())))
            .set(users::active.eq(active))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }
}
