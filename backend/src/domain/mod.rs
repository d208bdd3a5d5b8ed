//! Domain primitives, ports and services.
//!
//! Purpose: define the identity model (roles, users, credentials) and the
//! services that register and authenticate users against driven ports.
//! Nothing in here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error / ErrorCode — transport-agnostic error payload.
//! - Role, User and their value types.
//! - RoleRegistry, IdentityService — use-cases over the ports.
//! - bootstrap — startup routine returning the [`Bootstrapped`] token.

pub mod auth;
pub mod bootstrap;
pub mod capabilities;
pub mod error;
pub mod identity_error;
pub mod identity_service;
pub mod ports;
pub mod role;
pub mod role_registry;
pub mod user;

pub use self::auth::{Credentials, CredentialsValidationError, MAX_PASSWORD_BYTES, SessionIdentity};
pub use self::bootstrap::{Bootstrapped, bootstrap};
pub use self::capabilities::{has_role, is_active, is_guest, session_is_guest};
pub use self::error::{Error, ErrorCode};
pub use self::identity_error::IdentityError;
pub use self::identity_service::{IdentityOptions, IdentityService};
pub use self::role::{
    CHEF_ROLE, GUEST_ROLE, NewRole, Role, RoleId, RoleName, RoleValidationError, baseline_roles,
};
pub use self::role_registry::RoleRegistry;
pub use self::user::{
    EmailAddress, LoginEvent, LoginTelemetry, NewUser, PasswordHash, User, UserId, UserParts,
    UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use recipeapp::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::unauthorized("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
