//! Expense Reimbursement Domain
//!
//! This crate implements the lifecycle of an employee expense claim through a
//! two-stage approval: the employee submits, a manager decides, and only
//! after a manager approval does finance decide.
//!
//! # Claim Lifecycle
//!
//! ```text
//! pending -> approved_by_manager -> approved_by_finance
//!        \                      \-> rejected_by_finance
//!         \-> rejected_by_manager
//! ```
//!
//! # Layout
//!
//! - [`claim`]: the entity and its invariants
//! - [`workflow`]: pure transition and authorization rules
//! - [`visibility`]: which claims a principal may see
//! - [`ports`]: the storage port (and an in-memory adapter behind `mock`)
//! - [`service`]: read-decide-write orchestration over the port

pub mod claim;
pub mod workflow;
pub mod visibility;
pub mod stats;
pub mod ports;
pub mod service;
pub mod error;

pub use claim::{
    max_amount, Claim, ClaimContent, ClaimParts, ClaimState, ClaimStatus, ClaimVersion, Decision,
    ExpenseCategory, NewClaim, StatusBucket, AMOUNT_SCALE, MAX_TITLE_CHARS,
};
pub use workflow::{ApprovalStage, ClaimPatch, DecisionAction};
pub use visibility::ClaimScope;
pub use stats::ClaimStats;
pub use ports::ClaimStore;
pub use service::ReimbursementService;
pub use error::ClaimError;
