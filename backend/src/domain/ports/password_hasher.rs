//! Port for one-way password hashing.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::user::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum HashError {
        /// Stored hash could not be parsed.
        Malformed { message: String } => "stored password hash is malformed: {message}",
        /// Hashing backend failed.
        Backend { message: String } => "password hashing failed: {message}",
    }
}

/// Salted, cost-configurable password hashing.
///
/// Hashing the same password twice yields different encodings that both
/// verify.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password with a fresh salt.
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, HashError>;

    /// Compare plaintext with an encoded hash.
    async fn check(&self, plaintext: &str, hash: &PasswordHash) -> Result<bool, HashError>;

    /// Fail-closed verification: any error counts as a mismatch.
    async fn verify(&self, plaintext: &str, hash: &PasswordHash) -> bool {
        match self.check(plaintext, hash).await {
            Ok(matches) => matches,
            Err(error) => {
                warn!(%error, "password verification failed closed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    /// Returns a canned `check` outcome so the provided `verify` runs for real.
    struct CannedHasher(Result<bool, HashError>);

    #[async_trait]
    impl PasswordHasher for CannedHasher {
        async fn hash(&self, _plaintext: &str) -> Result<PasswordHash, HashError> {
            Err(HashError::backend("unused"))
        }

        async fn check(&self, _plaintext: &str, _hash: &PasswordHash) -> Result<bool, HashError> {
            self.0.clone()
        }
    }

    #[rstest]
    #[case(Ok(true), true)]
    #[case(Ok(false), false)]
    #[case(Err(HashError::malformed("bad prefix")), false)]
    #[case(Err(HashError::backend("oops")), false)]
    #[tokio::test]
    async fn verify_fails_closed(#[case] outcome: Result<bool, HashError>, #[case] expected: bool) {
        let hasher = CannedHasher(outcome);
        let hash = PasswordHash::from_encoded("$2b$04$whatever");
        assert_eq!(hasher.verify("pw", &hash).await, expected);
    }
}
