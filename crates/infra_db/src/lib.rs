//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL persistence for the reimbursement
//! system using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: repositories own the SQL and row
//! types, adapters implement domain ports on top of them.
//!
//! - [`repositories::ClaimsRepository`]: claim rows, guarded writes, aggregates
//! - [`adapters::PostgresClaimAdapter`]: the `ClaimStore` port
//! - [`provisioning`]: the principal directory (`users` table)
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresClaimAdapter;
//!
//! let pool = create_pool(&DatabaseConfig::new("postgres://localhost/reimbursement")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresClaimAdapter::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;
pub mod provisioning;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::PostgresClaimAdapter;
pub use provisioning::{default_directory, provision_directory, DirectoryEntry};
