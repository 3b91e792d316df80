//! Claim entity
//!
//! The lifecycle state and the per-stage decisions live in a single sum type,
//! `ClaimState`, so a decision can only exist alongside a status of matching
//! polarity:
//!
//! ```text
//! Pending
//!   ├── ApprovedByManager { manager }
//!   │     ├── ApprovedByFinance { manager, finance }
//!   │     └── RejectedByFinance { manager, finance }
//!   └── RejectedByManager { manager }
//! ```
//!
//! `Completed { manager, finance }` is reserved for an external disbursement
//! step and is only ever read back from storage.

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, CoreError, UserId};
use crate::error::ClaimError;

/// Longest accepted title, in characters
pub const MAX_TITLE_CHARS: usize = 200;

/// Decimal places kept for money amounts
pub const AMOUNT_SCALE: u32 = 2;

/// Largest amount a claim may carry: 13 integer digits, 2 decimal places
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999_999, AMOUNT_SCALE)
}

/// Current time at the microsecond resolution stores keep
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Awaiting the manager decision
    Pending,
    /// Manager approved, awaiting finance
    ApprovedByManager,
    /// Manager rejected
    RejectedByManager,
    /// Finance approved; payable
    ApprovedByFinance,
    /// Finance rejected
    RejectedByFinance,
    /// Paid out by the disbursement system
    Completed,
}

/// Coarse grouping used by the statistics aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 6] = [
        ClaimStatus::Pending,
        ClaimStatus::ApprovedByManager,
        ClaimStatus::RejectedByManager,
        ClaimStatus::ApprovedByFinance,
        ClaimStatus::RejectedByFinance,
        ClaimStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::ApprovedByManager => "approved_by_manager",
            ClaimStatus::RejectedByManager => "rejected_by_manager",
            ClaimStatus::ApprovedByFinance => "approved_by_finance",
            ClaimStatus::RejectedByFinance => "rejected_by_finance",
            ClaimStatus::Completed => "completed",
        }
    }

    /// Rejections and completion end the lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClaimStatus::RejectedByManager | ClaimStatus::RejectedByFinance | ClaimStatus::Completed
        )
    }

    pub fn bucket(&self) -> StatusBucket {
        match self {
            ClaimStatus::Pending => StatusBucket::Pending,
            ClaimStatus::ApprovedByManager
            | ClaimStatus::ApprovedByFinance
            | ClaimStatus::Completed => StatusBucket::Approved,
            ClaimStatus::RejectedByManager | ClaimStatus::RejectedByFinance => {
                StatusBucket::Rejected
            }
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::unknown_variant("claim status", s))
    }
}

/// Expense category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Transport,
    Accommodation,
    Meals,
    OfficeSupply,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Transport,
        ExpenseCategory::Accommodation,
        ExpenseCategory::Meals,
        ExpenseCategory::OfficeSupply,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Accommodation => "accommodation",
            ExpenseCategory::Meals => "meals",
            ExpenseCategory::OfficeSupply => "office_supply",
            ExpenseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CoreError::unknown_variant("category", s))
    }
}

/// Record of one approval stage: who acted, what they wrote, and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub actor_id: UserId,
    pub notes: Option<String>,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(actor_id: UserId, notes: Option<String>) -> Self {
        Self {
            actor_id,
            notes,
            decided_at: now(),
        }
    }
}

/// Lifecycle state with the decisions each state implies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimState {
    Pending,
    ApprovedByManager { manager: Decision },
    RejectedByManager { manager: Decision },
    ApprovedByFinance { manager: Decision, finance: Decision },
    RejectedByFinance { manager: Decision, finance: Decision },
    Completed { manager: Decision, finance: Decision },
}

impl ClaimState {
    pub fn status(&self) -> ClaimStatus {
        match self {
            ClaimState::Pending => ClaimStatus::Pending,
            ClaimState::ApprovedByManager { .. } => ClaimStatus::ApprovedByManager,
            ClaimState::RejectedByManager { .. } => ClaimStatus::RejectedByManager,
            ClaimState::ApprovedByFinance { .. } => ClaimStatus::ApprovedByFinance,
            ClaimState::RejectedByFinance { .. } => ClaimStatus::RejectedByFinance,
            ClaimState::Completed { .. } => ClaimStatus::Completed,
        }
    }

    pub fn manager_decision(&self) -> Option<&Decision> {
        match self {
            ClaimState::Pending => None,
            ClaimState::ApprovedByManager { manager }
            | ClaimState::RejectedByManager { manager }
            | ClaimState::ApprovedByFinance { manager, .. }
            | ClaimState::RejectedByFinance { manager, .. }
            | ClaimState::Completed { manager, .. } => Some(manager),
        }
    }

    pub fn finance_decision(&self) -> Option<&Decision> {
        match self {
            ClaimState::ApprovedByFinance { finance, .. }
            | ClaimState::RejectedByFinance { finance, .. }
            | ClaimState::Completed { finance, .. } => Some(finance),
            ClaimState::Pending
            | ClaimState::ApprovedByManager { .. }
            | ClaimState::RejectedByManager { .. } => None,
        }
    }

    /// Rebuilds a state from flat storage columns
    ///
    /// Fails when the combination could not have been produced by the
    /// workflow, e.g. a finance decision without a manager approval.
    pub fn from_parts(
        status: ClaimStatus,
        manager: Option<Decision>,
        finance: Option<Decision>,
    ) -> Result<Self, ClaimError> {
        let state = match (status, manager, finance) {
            (ClaimStatus::Pending, None, None) => ClaimState::Pending,
            (ClaimStatus::ApprovedByManager, Some(manager), None) => {
                ClaimState::ApprovedByManager { manager }
            }
            (ClaimStatus::RejectedByManager, Some(manager), None) => {
                ClaimState::RejectedByManager { manager }
            }
            (ClaimStatus::ApprovedByFinance, Some(manager), Some(finance)) => {
                ClaimState::ApprovedByFinance { manager, finance }
            }
            (ClaimStatus::RejectedByFinance, Some(manager), Some(finance)) => {
                ClaimState::RejectedByFinance { manager, finance }
            }
            (ClaimStatus::Completed, Some(manager), Some(finance)) => {
                ClaimState::Completed { manager, finance }
            }
            (status, manager, finance) => {
                return Err(ClaimError::InconsistentRecord(format!(
                    "status {} with manager decision {} and finance decision {}",
                    status,
                    if manager.is_some() { "set" } else { "unset" },
                    if finance.is_some() { "set" } else { "unset" },
                )))
            }
        };
        Ok(state)
    }
}

/// Employee-editable content of a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimContent {
    pub title: String,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    /// Opaque reference produced by the receipt upload service
    pub receipt_reference: String,
}

impl ClaimContent {
    /// Checks the content rules shared by submission and editing
    pub fn validate(&self) -> Result<(), ClaimError> {
        require_title(&self.title)?;
        require_text("description", &self.description)?;
        require_amount(self.amount)?;
        require_text("receipt_reference", &self.receipt_reference)?;
        Ok(())
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ClaimError> {
    if value.trim().is_empty() {
        return Err(ClaimError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_title(title: &str) -> Result<(), ClaimError> {
    require_text("title", title)?;
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ClaimError::validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}

/// Positive, at most two decimal places, and within the stored precision
///
/// Trailing zeros do not count towards the scale, so `12.500` is accepted
/// as `12.50`.
pub(crate) fn require_amount(amount: Decimal) -> Result<(), ClaimError> {
    if amount <= Decimal::ZERO {
        return Err(ClaimError::validation(format!(
            "amount must be greater than zero, got {amount}"
        )));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(ClaimError::validation(format!(
            "amount must have at most {AMOUNT_SCALE} decimal places, got {amount}"
        )));
    }
    if amount > max_amount() {
        return Err(ClaimError::validation(format!(
            "amount must not exceed {}, got {amount}",
            max_amount()
        )));
    }
    Ok(())
}

/// A validated submission that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    pub employee_id: UserId,
    pub content: ClaimContent,
    pub submitted_at: DateTime<Utc>,
}

impl NewClaim {
    /// Attaches the id assigned by the store
    pub fn into_claim(self, id: ClaimId) -> Claim {
        Claim {
            id,
            employee_id: self.employee_id,
            content: self.content,
            state: ClaimState::Pending,
            revision: 0,
            employee_name: None,
            submitted_at: self.submitted_at,
            updated_at: self.submitted_at,
        }
    }
}

/// What a guarded write expects to find in the store
///
/// The revision advances on every accepted write, so a snapshot taken
/// before a concurrent edit no longer matches even when the status does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimVersion {
    pub status: ClaimStatus,
    pub revision: i64,
}

impl fmt::Display for ClaimVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rev {}", self.status, self.revision)
    }
}

/// Flat view of a persisted claim, used by store adapters to rebuild a
/// `Claim` through `Claim::restore`
#[derive(Debug, Clone)]
pub struct ClaimParts {
    pub id: ClaimId,
    pub employee_id: UserId,
    pub content: ClaimContent,
    pub status: ClaimStatus,
    pub manager_decision: Option<Decision>,
    pub finance_decision: Option<Decision>,
    pub revision: i64,
    /// Directory display name of the owner, if the store knows it
    pub employee_name: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reimbursement claim and its decision trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    id: ClaimId,
    employee_id: UserId,
    #[serde(flatten)]
    content: ClaimContent,
    #[serde(flatten)]
    state: ClaimState,
    revision: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    employee_name: Option<String>,
    submitted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Claim {
    /// Rebuilds a claim from storage, re-checking every entity invariant
    pub fn restore(parts: ClaimParts) -> Result<Self, ClaimError> {
        parts
            .content
            .validate()
            .map_err(|e| ClaimError::InconsistentRecord(format!("claim {}: {}", parts.id, e)))?;
        let state = ClaimState::from_parts(
            parts.status,
            parts.manager_decision,
            parts.finance_decision,
        )?;

        Ok(Self {
            id: parts.id,
            employee_id: parts.employee_id,
            content: parts.content,
            state,
            revision: parts.revision,
            employee_name: parts.employee_name,
            submitted_at: parts.submitted_at,
            updated_at: parts.updated_at,
        })
    }

    pub fn id(&self) -> ClaimId {
        self.id
    }

    pub fn employee_id(&self) -> UserId {
        self.employee_id
    }

    pub fn content(&self) -> &ClaimContent {
        &self.content
    }

    pub fn state(&self) -> &ClaimState {
        &self.state
    }

    pub fn status(&self) -> ClaimStatus {
        self.state.status()
    }

    pub fn manager_decision(&self) -> Option<&Decision> {
        self.state.manager_decision()
    }

    pub fn finance_decision(&self) -> Option<&Decision> {
        self.state.finance_decision()
    }

    /// Number of accepted writes since submission
    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Status and revision, for compare-and-set writes
    pub fn version(&self) -> ClaimVersion {
        ClaimVersion {
            status: self.status(),
            revision: self.revision,
        }
    }

    /// Owner's display name; read-only, filled in by the store
    pub fn employee_name(&self) -> Option<&str> {
        self.employee_name.as_deref()
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.employee_id == user
    }

    pub(crate) fn content_mut(&mut self) -> &mut ClaimContent {
        &mut self.content
    }

    pub(crate) fn set_state(&mut self, state: ClaimState) {
        self.state = state;
    }

    pub(crate) fn set_employee_name(&mut self, name: Option<String>) {
        self.employee_name = name;
    }

    /// Marks an accepted change
    pub(crate) fn touch(&mut self) {
        self.revision += 1;
        self.updated_at = now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(amount: Decimal) -> ClaimContent {
        ClaimContent {
            title: "Taxi".to_string(),
            description: "Airport transfer".to_string(),
            category: ExpenseCategory::Transport,
            amount,
            receipt_reference: "/uploads/taxi.pdf".to_string(),
        }
    }

    fn decision(actor: i64) -> Decision {
        Decision::new(UserId::new(actor), None)
    }

    #[test]
    fn test_status_strings_roundtrip() {
        for status in ClaimStatus::ALL {
            assert_eq!(status.as_str().parse::<ClaimStatus>().unwrap(), status);
        }
        assert!("approved_manager".parse::<ClaimStatus>().is_err());
    }

    #[test]
    fn test_category_rejects_unknown() {
        assert_eq!(
            "office_supply".parse::<ExpenseCategory>().unwrap(),
            ExpenseCategory::OfficeSupply
        );
        assert!("travel".parse::<ExpenseCategory>().is_err());
    }

    #[test]
    fn test_terminal_set() {
        let terminal: Vec<_> = ClaimStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![
                ClaimStatus::RejectedByManager,
                ClaimStatus::RejectedByFinance,
                ClaimStatus::Completed
            ]
        );
    }

    #[test]
    fn test_content_validation() {
        assert!(content(Decimal::new(5000, 2)).validate().is_ok());
        assert!(content(Decimal::ZERO).validate().is_err());
        assert!(content(Decimal::new(-1, 0)).validate().is_err());

        let mut blank = content(Decimal::ONE);
        blank.receipt_reference = "   ".to_string();
        assert!(blank.validate().unwrap_err().to_string().contains("receipt_reference"));
    }

    #[test]
    fn test_from_parts_accepts_workflow_shapes() {
        assert_eq!(
            ClaimState::from_parts(ClaimStatus::Pending, None, None).unwrap(),
            ClaimState::Pending
        );
        let state =
            ClaimState::from_parts(ClaimStatus::RejectedByFinance, Some(decision(2)), Some(decision(3)))
                .unwrap();
        assert_eq!(state.status(), ClaimStatus::RejectedByFinance);
        assert_eq!(state.manager_decision().unwrap().actor_id, UserId::new(2));
        assert_eq!(state.finance_decision().unwrap().actor_id, UserId::new(3));
    }

    #[test]
    fn test_from_parts_rejects_impossible_shapes() {
        assert!(ClaimState::from_parts(ClaimStatus::Pending, Some(decision(2)), None).is_err());
        assert!(ClaimState::from_parts(ClaimStatus::ApprovedByManager, None, None).is_err());
        assert!(ClaimState::from_parts(ClaimStatus::RejectedByManager, Some(decision(2)), Some(decision(3))).is_err());
        assert!(ClaimState::from_parts(ClaimStatus::ApprovedByFinance, None, Some(decision(3))).is_err());
    }

    #[test]
    fn test_restore_rejects_non_positive_amount() {
        let parts = ClaimParts {
            id: ClaimId::new(1),
            employee_id: UserId::new(1),
            content: content(Decimal::ZERO),
            status: ClaimStatus::Pending,
            manager_decision: None,
            finance_decision: None,
            revision: 0,
            employee_name: None,
            submitted_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(Claim::restore(parts), Err(ClaimError::InconsistentRecord(_))));
    }

    #[test]
    fn test_amount_must_fit_two_decimal_places() {
        assert!(content(Decimal::new(12345, 3)).validate().is_err());
        assert!(content(Decimal::new(1, 3)).validate().is_err());
        assert!(content(Decimal::new(12500, 3)).validate().is_ok());
        assert!(content(Decimal::new(1, 2)).validate().is_ok());
    }

    #[test]
    fn test_amount_precision_bound() {
        assert!(content(max_amount()).validate().is_ok());
        let too_large = max_amount() + Decimal::new(1, 2);
        let error = content(too_large).validate().unwrap_err();
        assert!(matches!(error, ClaimError::Validation(_)));
        assert!(content(Decimal::new(10_000_000_000_000, 0)).validate().is_err());
    }

    #[test]
    fn test_title_length_is_bounded_in_characters() {
        let mut at_limit = content(Decimal::ONE);
        at_limit.title = "é".repeat(MAX_TITLE_CHARS);
        assert!(at_limit.validate().is_ok());

        at_limit.title.push('x');
        assert!(at_limit.validate().unwrap_err().to_string().contains("title"));
    }

    #[test]
    fn test_timestamps_are_microsecond_precise() {
        assert_eq!(now().timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_claim_serializes_flat() {
        let claim = NewClaim {
            employee_id: UserId::new(8),
            content: content(Decimal::new(50, 0)),
            submitted_at: Utc::now(),
        }
        .into_claim(ClaimId::new(3));

        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["employee_id"], 8);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["category"], "transport");
        assert_eq!(json["revision"], 0);
        assert!(json.get("employee_name").is_none());
    }
}
