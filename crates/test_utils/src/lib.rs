//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! reimbursement test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built principals and claim content
//! - `builders`: Builders that drive a claim into any status
//! - `database`: PostgreSQL container management for adapter tests
//! - `assertions`: Invariant and error-kind assertions
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
