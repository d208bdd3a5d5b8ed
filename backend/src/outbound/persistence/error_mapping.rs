//! Diesel and pool error mapping for the credential store.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use crate::domain::ports::CredentialStoreError;

use super::pool::PoolError;

pub(crate) fn map_pool_error(error: PoolError) -> CredentialStoreError {
    CredentialStoreError::connection(error.into_message())
}

/// Map Diesel failures, keeping the constraint name of unique violations.
pub(crate) fn map_diesel_error(error: DieselError) -> CredentialStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => CredentialStoreError::query("record not found"),
        DieselError::QueryBuilderError(_) => CredentialStoreError::query("database query error"),
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation => {
                let constraint = info.constraint_name().unwrap_or("unknown");
                CredentialStoreError::unique_violation(constraint)
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                warn!(
                    constraint_name = ?info.constraint_name(),
                    "write referenced a missing row"
                );
                CredentialStoreError::query("referenced row does not exist")
            }
            DatabaseErrorKind::ClosedConnection => {
                CredentialStoreError::connection("database connection error")
            }
            _ => CredentialStoreError::query("database error"),
        },
        DieselError::BrokenTransactionManager => {
            CredentialStoreError::connection("transaction manager broken")
        }
        _ => CredentialStoreError::query("database error"),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use diesel::result::DatabaseErrorInformation;
    use rstest::rstest;

    struct Info {
        constraint: Option<&'static str>,
    }

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "violation"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: Option<&'static str>) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info { constraint }))
    }

    #[rstest]
    #[case(Some("users_email_key"), "users_email_key")]
    #[case(None, "unknown")]
    fn unique_violation_keeps_constraint(
        #[case] constraint: Option<&'static str>,
        #[case] expected: &str,
    ) {
        let err = map_diesel_error(database_error(DatabaseErrorKind::UniqueViolation, constraint));
        assert_eq!(err, CredentialStoreError::unique_violation(expected));
    }

    #[rstest]
    fn closed_connection_is_transient() {
        let err = map_diesel_error(database_error(DatabaseErrorKind::ClosedConnection, None));
        assert!(err.is_transient());
    }

    #[rstest]
    fn foreign_key_violation_is_a_query_error() {
        let err = map_diesel_error(database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            Some("roles_users_role_id_fkey"),
        ));
        assert!(matches!(err, CredentialStoreError::Query { .. }));
    }

    #[rstest]
    fn pool_errors_are_connection_errors() {
        let err = map_pool_error(PoolError::checkout("timed out"));
        assert_eq!(err, CredentialStoreError::connection("timed out"));
    }
}
