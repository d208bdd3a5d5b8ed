//! bcrypt-backed [`PasswordHasher`].
//!
//! bcrypt is CPU-bound by design, so both hashing and verification run on
//! the blocking thread pool to keep request workers responsive.

use async_trait::async_trait;
use bcrypt::BcryptError;
use zeroize::Zeroizing;

use crate::domain::{MAX_PASSWORD_BYTES, PasswordHash};
use crate::domain::ports::{HashError, PasswordHasher};

/// Lowest work factor bcrypt accepts.
pub const MIN_COST: u32 = 4;
/// Highest work factor bcrypt accepts.
pub const MAX_COST: u32 = 31;
/// Production work factor.
pub const DEFAULT_COST: u32 = 12;

/// Rejected bcrypt work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("bcrypt cost {0} is outside {MIN_COST}..={MAX_COST}")]
pub struct CostOutOfRange(pub u32);

/// Salted bcrypt hashing with a configurable cost.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Build a hasher, validating the cost.
    pub fn new(cost: u32) -> Result<Self, CostOutOfRange> {
        if (MIN_COST..=MAX_COST).contains(&cost) {
            Ok(Self { cost })
        } else {
            Err(CostOutOfRange(cost))
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

fn map_bcrypt_error(error: BcryptError) -> HashError {
    match error {
        BcryptError::InvalidHash(_)
        | BcryptError::InvalidPrefix(_)
        | BcryptError::InvalidCost(_)
        | BcryptError::InvalidBase64(_) => HashError::malformed(error.to_string()),
        other => HashError::backend(other.to_string()),
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T, HashError>
where
    F: FnOnce() -> Result<T, BcryptError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| HashError::backend(format!("hashing task failed: {err}")))?
        .map_err(map_bcrypt_error)
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, HashError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::backend(format!(
                "password exceeds {MAX_PASSWORD_BYTES} bytes"
            )));
        }
        let cost = self.cost;
        let password = Zeroizing::new(plaintext.to_owned());
        let encoded = run_blocking(move || bcrypt::hash(password.as_bytes(), cost)).await?;
        Ok(PasswordHash::from_encoded(encoded))
    }

    async fn check(&self, plaintext: &str, hash: &PasswordHash) -> Result<bool, HashError> {
        // bcrypt ignores bytes past the limit; such input never matches.
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        let password = Zeroizing::new(plaintext.to_owned());
        let encoded = hash.as_str().to_owned();
        run_blocking(move || bcrypt::verify(password.as_bytes(), &encoded)).await
    }
}
