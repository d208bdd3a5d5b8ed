//! User data model.
//!
//! A [`User`] is a plain record: identity, credentials hash, activation flag,
//! login telemetry and the roles it holds. Capability checks such as
//! [`is_guest`](crate::domain::capabilities::is_guest) live beside it as free
//! functions rather than methods on the entity.

use std::fmt;
use std::net::IpAddr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::domain::role::{Role, RoleId};

/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 255;

/// Validation errors returned by user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyEmail,
    EmailTooLong { max: usize },
    InvalidEmail,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must look like local@domain"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Store-assigned numeric user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(i32);

impl UserId {
    /// Wrap a raw identifier read from storage or a session cookie.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw identifier for storage adapters.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // One `@`, non-empty local part and domain, no whitespace anywhere.
        let pattern = r"^[^@\s]+@[^@\s]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Unique login email.
///
/// ## Invariants
/// - trimmed of surrounding whitespace, case preserved;
/// - at most [`EMAIL_MAX`] characters with exactly one `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    pub fn new(raw: &str) -> Result<Self, UserValidationError> {
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if normalized.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !email_regex().is_match(normalized) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalized.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-way password hash. Never holds plaintext.
///
/// Values come from a [`PasswordHasher`](crate::domain::ports::PasswordHasher)
/// or are loaded back from storage by an adapter.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a hasher or read from storage.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded hash for storage adapters and verifiers.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// A successful login observed by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEvent {
    pub at: DateTime<Utc>,
    pub ip: Option<IpAddr>,
}

impl LoginEvent {
    /// Login happening now from the given client address.
    pub fn now(ip: Option<IpAddr>) -> Self {
        Self { at: Utc::now(), ip }
    }
}

/// Login bookkeeping kept on each user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginTelemetry {
    pub last_login_at: Option<DateTime<Utc>>,
    pub current_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub current_login_ip: Option<String>,
    pub login_count: u32,
}

impl LoginTelemetry {
    /// Rotate the current login into `last_*` and record `event` as current.
    pub fn record(&mut self, event: &LoginEvent) {
        self.last_login_at = self.current_login_at.take();
        self.last_login_ip = self.current_login_ip.take();
        self.current_login_at = Some(event.at);
        self.current_login_ip = event.ip.map(|ip| ip.to_string());
        self.login_count = self.login_count.saturating_add(1);
    }
}

/// Stored parts used by adapters to rebuild a [`User`].
#[derive(Debug, Clone)]
pub struct UserParts {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub active: bool,
    pub telemetry: LoginTelemetry,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub roles: Vec<Role>,
}

/// Application user.
///
/// ## Invariants
/// - `email` is unique across the store;
/// - `password_hash` is always a hash, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: EmailAddress,
    password_hash: PasswordHash,
    first_name: Option<String>,
    last_name: Option<String>,
    active: bool,
    telemetry: LoginTelemetry,
    confirmed_at: Option<DateTime<Utc>>,
    roles: Vec<Role>,
}

impl User {
    /// Rebuild a user from its stored parts.
    pub fn from_parts(parts: UserParts) -> Self {
        let UserParts {
            id,
            email,
            password_hash,
            first_name,
            last_name,
            active,
            telemetry,
            confirmed_at,
            roles,
        } = parts;
        Self {
            id,
            email,
            password_hash,
            first_name,
            last_name,
            active,
            telemetry,
            confirmed_at,
            roles,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn telemetry(&self) -> &LoginTelemetry {
        &self.telemetry
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Apply a login event to the in-memory telemetry.
    pub fn record_login(&mut self, event: &LoginEvent) {
        self.telemetry.record(event);
    }

    /// Flip the activation flag.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// A user waiting to be written by the credential store.
///
/// New users are always active and carry no login history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    email: EmailAddress,
    password_hash: PasswordHash,
    role_ids: Vec<RoleId>,
}

impl NewUser {
    pub fn new(email: EmailAddress, password_hash: PasswordHash, role_ids: Vec<RoleId>) -> Self {
        Self {
            email,
            password_hash,
            role_ids,
        }
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn role_ids(&self) -> &[RoleId] {
        &self.role_ids
    }

    /// Attach the store-assigned id and resolved roles once written.
    pub fn into_user(self, id: UserId, roles: Vec<Role>) -> User {
        User::from_parts(UserParts {
            id,
            email: self.email,
            password_hash: self.password_hash,
            first_name: None,
            last_name: None,
            active: true,
            telemetry: LoginTelemetry::default(),
            confirmed_at: None,
            roles,
        })
    }
}
