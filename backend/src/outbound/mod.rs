//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: credential stores (PostgreSQL via Diesel, in-memory)
//! - **crypto**: bcrypt password hashing
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod crypto;
pub mod persistence;
