//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::ports::CredentialStoreError;
use crate::domain::{
    EmailAddress, LoginTelemetry, PasswordHash, Role, RoleId, RoleName, User, UserId, UserParts,
};

use super::schema::{roles, roles_users, users};

/// Row struct for reading from the roles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoleRow {
    pub id: i32,
    pub name: String,
    pub description: String,
}

impl RoleRow {
    pub(crate) fn into_role(self) -> Result<Role, CredentialStoreError> {
        let name = RoleName::new(self.name)
            .map_err(|err| CredentialStoreError::query(format!("stored role name invalid: {err}")))?;
        Ok(Role::new(RoleId::new(self.id), name, self.description))
    }
}

/// Insertable struct for creating role records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = roles)]
pub(crate) struct NewRoleRow<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub active: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub current_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub current_login_ip: Option<String>,
    pub login_count: i32,
}

impl UserRow {
    /// Combine the row with its loaded roles into a domain user.
    pub(crate) fn into_user(self, role_rows: Vec<RoleRow>) -> Result<User, CredentialStoreError> {
        let email = EmailAddress::new(&self.email)
            .map_err(|err| CredentialStoreError::query(format!("stored email invalid: {err}")))?;
        let login_count = u32::try_from(self.login_count)
            .map_err(|_| CredentialStoreError::query("stored login count is negative"))?;
        let roles = role_rows
            .into_iter()
            .map(RoleRow::into_role)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(User::from_parts(UserParts {
            id: UserId::new(self.id),
            email,
            password_hash: PasswordHash::from_encoded(self.password_hash),
            first_name: self.first_name,
            last_name: self.last_name,
            active: self.active,
            telemetry: LoginTelemetry {
                last_login_at: self.last_login_at,
                current_login_at: self.current_login_at,
                last_login_ip: self.last_login_ip,
                current_login_ip: self.current_login_ip,
                login_count,
            },
            confirmed_at: self.confirmed_at,
            roles,
        }))
    }
}

/// Insertable struct for creating user records. Telemetry and `active` use
/// column defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Insertable struct for user/role links.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = roles_users)]
pub(crate) struct RoleLinkRow {
    pub user_id: i32,
    pub role_id: i32,
}
