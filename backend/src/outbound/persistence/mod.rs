//! Credential store adapters.
//!
//! - [`DieselCredentialStore`]: PostgreSQL via Diesel, `diesel-async` and a
//!   `bb8` pool. Row structs (`models.rs`) and table definitions
//!   (`schema.rs`) stay private to this module.
//! - [`InMemoryCredentialStore`]: process-local store for development and
//!   tests.
//!
//! # Example
//!
//! ```ignore
//! use recipeapp::outbound::persistence::{DbPool, DieselCredentialStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/recipes")).await?;
//! let store = DieselCredentialStore::new(pool);
//! ```

mod diesel_credential_store;
mod error_mapping;
mod in_memory_credential_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_credential_store::DieselCredentialStore;
pub use in_memory_credential_store::InMemoryCredentialStore;
pub use migrations::{MIGRATIONS, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
