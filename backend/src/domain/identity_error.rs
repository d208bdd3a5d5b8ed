//! Errors surfaced by the identity service and their transport mapping.

use tracing::error;

use crate::domain::error::Error;
use crate::domain::ports::{CredentialStoreError, HashError, USER_EMAIL_CONSTRAINT};

/// Failures returned by [`IdentityService`](crate::domain::IdentityService)
/// and [`RoleRegistry`](crate::domain::RoleRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The email is already registered.
    #[error("email already registered")]
    DuplicateEmail,
    /// Unknown email, wrong password, unreadable hash or inactive account.
    #[error("invalid credentials")]
    AuthFailure,
    /// A requested role does not exist.
    #[error("role not found: {role}")]
    RoleNotFound { role: String },
    /// Input failed validation.
    #[error("invalid input: {message}")]
    Invalid { message: String },
    /// Storage is temporarily unreachable.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },
    /// Storage rejected the operation.
    #[error("storage failure: {message}")]
    Storage { message: String },
    /// Password hashing failed.
    #[error("hashing failure: {message}")]
    Hashing { message: String },
}

impl IdentityError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn role_not_found(role: impl Into<String>) -> Self {
        Self::RoleNotFound { role: role.into() }
    }
}

/// Translate a store failure, treating the email constraint as a duplicate.
pub fn map_store_error(err: CredentialStoreError) -> IdentityError {
    match err {
        CredentialStoreError::UniqueViolation { constraint } if constraint == USER_EMAIL_CONSTRAINT => {
            IdentityError::DuplicateEmail
        }
        other if other.is_transient() => IdentityError::StorageUnavailable {
            message: other.to_string(),
        },
        other => IdentityError::Storage {
            message: other.to_string(),
        },
    }
}

impl From<CredentialStoreError> for IdentityError {
    fn from(err: CredentialStoreError) -> Self {
        map_store_error(err)
    }
}

impl From<HashError> for IdentityError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::Malformed { .. } => Self::AuthFailure,
            HashError::Backend { message } => Self::Hashing { message },
        }
    }
}

impl From<IdentityError> for Error {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::DuplicateEmail => Self::conflict("email already registered"),
            IdentityError::AuthFailure => Self::unauthorized("invalid credentials"),
            IdentityError::RoleNotFound { role } => {
                Self::invalid_request(format!("unknown role: {role}"))
            }
            IdentityError::Invalid { message } => Self::invalid_request(message),
            IdentityError::StorageUnavailable { message } => {
                error!(%message, "identity storage unavailable");
                Self::service_unavailable("storage temporarily unavailable")
            }
            IdentityError::Storage { message } | IdentityError::Hashing { message } => {
                error!(%message, "identity operation failed");
                Self::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::ROLE_NAME_CONSTRAINT;
    use rstest::rstest;

    #[rstest]
    #[case(
        CredentialStoreError::unique_violation(USER_EMAIL_CONSTRAINT),
        IdentityError::DuplicateEmail
    )]
    #[case(
        CredentialStoreError::connection("refused"),
        IdentityError::StorageUnavailable {
            message: "credential store connection failed: refused".to_owned()
        }
    )]
    #[case(
        CredentialStoreError::unique_violation(ROLE_NAME_CONSTRAINT),
        IdentityError::Storage {
            message: "unique constraint violated: roles_name_key".to_owned()
        }
    )]
    fn store_errors_map_to_identity_errors(
        #[case] input: CredentialStoreError,
        #[case] expected: IdentityError,
    ) {
        assert_eq!(map_store_error(input), expected);
    }

    #[rstest]
    fn malformed_hash_reads_as_auth_failure() {
        let err: IdentityError = HashError::malformed("bad prefix").into();
        assert_eq!(err, IdentityError::AuthFailure);
    }

    #[rstest]
    #[case(IdentityError::DuplicateEmail, ErrorCode::Conflict)]
    #[case(IdentityError::AuthFailure, ErrorCode::Unauthorized)]
    #[case(IdentityError::role_not_found("chef"), ErrorCode::InvalidRequest)]
    #[case(IdentityError::invalid("bad email"), ErrorCode::InvalidRequest)]
    #[case(
        IdentityError::StorageUnavailable { message: "down".to_owned() },
        ErrorCode::ServiceUnavailable
    )]
    #[case(IdentityError::Storage { message: "boom".to_owned() }, ErrorCode::InternalError)]
    #[case(IdentityError::Hashing { message: "boom".to_owned() }, ErrorCode::InternalError)]
    fn identity_errors_map_to_codes(#[case] input: IdentityError, #[case] expected: ErrorCode) {
        assert_eq!(Error::from(input).code(), expected);
    }

    #[rstest]
    fn internal_details_are_redacted() {
        let err = Error::from(IdentityError::Storage {
            message: "relation users does not exist".to_owned(),
        });
        assert_eq!(err.message(), "Internal server error");
    }
}
