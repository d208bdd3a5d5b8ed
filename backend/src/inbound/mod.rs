//! Inbound adapters translating external requests into identity use-cases.

pub mod http;
