//! Authentication primitives: login credentials and session identity.
//!
//! Inbound adapters validate raw strings through these constructors before
//! calling the identity service, keeping payload parsing out of the domain.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::role::RoleName;
use crate::domain::user::{EmailAddress, User, UserId, UserValidationError};

/// Longest password, in bytes, that bcrypt hashes without truncation.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was blank or malformed.
    Email(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password is longer than [`MAX_PASSWORD_BYTES`].
    PasswordTooLong { length: usize },
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(inner) => write!(f, "{inner}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooLong { length } => write!(
                f,
                "password is {length} bytes; at most {MAX_PASSWORD_BYTES} are allowed"
            ),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated email/password pair.
///
/// ## Invariants
/// - `email` satisfies [`EmailAddress`] validation.
/// - `password` is non-empty, at most [`MAX_PASSWORD_BYTES`] bytes, and keeps
///   caller-provided whitespace. It is wiped from memory when dropped.
///
/// # Examples
/// ```
/// use recipeapp::domain::Credentials;
///
/// let creds = Credentials::try_from_parts("a@x.com", "pw").unwrap();
/// assert_eq!(creds.email().as_str(), "a@x.com");
/// assert_eq!(creds.password(), "pw");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = EmailAddress::new(email).map_err(CredentialsValidationError::Email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(CredentialsValidationError::PasswordTooLong {
                length: password.len(),
            });
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Plaintext password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Who is behind the current request.
///
/// Anonymous callers are guests by definition; authenticated callers carry
/// the role names resolved at login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionIdentity {
    #[default]
    Anonymous,
    Authenticated {
        user_id: UserId,
        roles: Vec<RoleName>,
    },
}

impl SessionIdentity {
    /// Identity for a freshly authenticated user.
    pub fn for_user(user: &User) -> Self {
        Self::Authenticated {
            user_id: user.id(),
            roles: user.roles().iter().map(|role| role.name().clone()).collect(),
        }
    }

    /// Drop back to the anonymous identity.
    pub fn logout(&mut self) {
        *self = Self::Anonymous;
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { user_id, .. } => Some(*user_id),
        }
    }
}
