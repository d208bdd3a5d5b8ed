//! Cryptographic adapters.

mod bcrypt_hasher;

pub use bcrypt_hasher::{BcryptPasswordHasher, CostOutOfRange, DEFAULT_COST, MAX_COST, MIN_COST};
