//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

use crate::domain::ports::{CredentialStore, PasswordHasher};
use crate::domain::{IdentityOptions, IdentityService, RoleRegistry, bootstrap};
use crate::outbound::crypto::{BcryptPasswordHasher, MIN_COST};
use crate::outbound::persistence::InMemoryCredentialStore;

use super::state::HttpState;

/// Session middleware with a fresh key and the `Secure` flag off for plain
/// HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Bootstrapped state over an empty in-memory store with cheap hashing.
pub async fn in_memory_state(options: IdentityOptions) -> HttpState {
    let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
    let hasher: Arc<dyn PasswordHasher> =
        Arc::new(BcryptPasswordHasher::new(MIN_COST).expect("minimum cost is valid"));
    let registry = RoleRegistry::new(Arc::clone(&store));
    let token = bootstrap(&registry).await.expect("bootstrap succeeds");
    HttpState::new(IdentityService::new(store, hasher, options), &token)
}
