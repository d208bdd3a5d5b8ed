//! Example account seeding for development databases.

mod seed;

pub use seed::{
    EXAMPLE_PASSWORD, EXAMPLE_USERS, EphemeralTarget, ExampleUser, SeedReport,
    require_persistent_target, seed_example_users,
};
