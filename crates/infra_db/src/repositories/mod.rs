//! Repository implementations for domain entities
//!
//! Repositories encapsulate SQL queries and map between database rows and
//! plain row structs. Conversion to domain types happens in `adapters`.
//!
//! # Architecture
//!
//! Each repository follows these principles:
//! - Runtime-checked queries through `FromRow`
//! - Transaction support for guarded writes
//! - Compare-and-set on status for every mutation of an existing claim

pub mod claims;

pub use claims::ClaimsRepository;
