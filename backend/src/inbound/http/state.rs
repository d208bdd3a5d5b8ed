//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and only depend on the
//! identity use-cases, never on a concrete store or hasher.

use crate::domain::ports::{CredentialStore, PasswordHasher};
use crate::domain::{Bootstrapped, IdentityService};

/// Identity service over type-erased ports.
pub type SharedIdentityService = IdentityService<dyn CredentialStore, dyn PasswordHasher>;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub identity: SharedIdentityService,
}

impl HttpState {
    /// Build handler state. Requires proof that the baseline roles exist.
    pub fn new(identity: SharedIdentityService, _bootstrapped: &Bootstrapped) -> Self {
        Self { identity }
    }
}
