//! Capability checks over users and session identities.
//!
//! These are pure functions of the data they receive; no storage access.

use crate::domain::auth::SessionIdentity;
use crate::domain::role::GUEST_ROLE;
use crate::domain::user::User;

/// A user is a guest when they hold no roles or hold the `guest` role.
pub fn is_guest(user: &User) -> bool {
    user.roles().is_empty() || has_role(user, GUEST_ROLE)
}

/// Exact, case-sensitive role membership.
pub fn has_role(user: &User, role: &str) -> bool {
    user.roles().iter().any(|held| held.name().as_str() == role)
}

pub fn is_active(user: &User) -> bool {
    user.is_active()
}

/// Guest check for whoever is behind a request. Anonymous callers are guests.
pub fn session_is_guest(identity: &SessionIdentity) -> bool {
    match identity {
        SessionIdentity::Anonymous => true,
        SessionIdentity::Authenticated { roles, .. } => {
            roles.is_empty() || roles.iter().any(|name| name.as_str() == GUEST_ROLE)
        }
    }
}
