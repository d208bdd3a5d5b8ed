//! Identity and role subsystem of the recipe application.
//!
//! - [`domain`]: users, roles, credentials and the identity use-cases.
//! - [`outbound`]: bcrypt hashing and credential stores.
//! - [`inbound`]: Actix HTTP handlers.
//! - [`example_data`]: the `make-users` seeding routine.

pub mod domain;
pub mod example_data;
pub mod inbound;
pub mod outbound;
pub mod settings;
pub mod stack;

pub use stack::{IdentityStack, StartupError};
