//! Embedded schema migrations.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::ports::CredentialStoreError;

/// Migrations compiled from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply every pending migration. Returns how many ran.
///
/// Uses a blocking connection on the blocking thread pool, as
/// `diesel_migrations` has no async harness.
pub async fn run_pending_migrations(database_url: &str) -> Result<usize, CredentialStoreError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url)
            .map_err(|err| CredentialStoreError::connection(err.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.len())
            .map_err(|err| CredentialStoreError::query(format!("migration failed: {err}")))
    })
    .await
    .map_err(|err| CredentialStoreError::query(format!("migration task failed: {err}")))??;
    info!(applied, "database migrations applied");
    Ok(applied)
}
