//! Core Kernel - Foundational types shared by the reimbursement system
//!
//! This crate provides the building blocks used across the domain, storage and
//! transport crates:
//! - Strongly typed integer identifiers
//! - The authenticated principal and its closed set of roles
//! - Port error and health abstractions for swappable adapters

pub mod identifiers;
pub mod principal;
pub mod ports;
pub mod error;

pub use identifiers::{ClaimId, UserId};
pub use principal::{Principal, Role};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use error::CoreError;
