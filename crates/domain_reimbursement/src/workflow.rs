//! Reimbursement workflow engine
//!
//! Pure decision logic: each operation takes the acting principal and the
//! current claim, and returns either the next claim value or the reason the
//! operation is refused. Nothing here touches storage; the caller persists
//! the result with a compare-and-set on the pre-state status.
//!
//! # Transition table
//!
//! ```text
//! pending             --manager.approve--> approved_by_manager
//! pending             --manager.reject-->  rejected_by_manager
//! approved_by_manager --finance.approve--> approved_by_finance
//! approved_by_manager --finance.reject-->  rejected_by_finance
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CoreError, Principal, Role};

use crate::claim::{
    now, require_amount, require_text, require_title, Claim, ClaimContent, ClaimState, ClaimStatus,
    Decision, ExpenseCategory, NewClaim,
};
use crate::error::ClaimError;

/// One of the two sequential approval checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStage {
    Manager,
    Finance,
}

impl ApprovalStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStage::Manager => "manager",
            ApprovalStage::Finance => "finance",
        }
    }

    /// Role entitled to decide this stage
    pub fn required_role(&self) -> Role {
        match self {
            ApprovalStage::Manager => Role::Manager,
            ApprovalStage::Finance => Role::Finance,
        }
    }

    /// Status a claim must be in for this stage to be decided
    pub fn required_status(&self) -> ClaimStatus {
        match self {
            ApprovalStage::Manager => ClaimStatus::Pending,
            ApprovalStage::Finance => ClaimStatus::ApprovedByManager,
        }
    }
}

impl fmt::Display for ApprovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(ApprovalStage::Manager),
            "finance" => Ok(ApprovalStage::Finance),
            other => Err(CoreError::unknown_variant("approval stage", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Approve,
    Reject,
}

impl DecisionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionAction::Approve => "approve",
            DecisionAction::Reject => "reject",
        }
    }
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial content update
///
/// `None` leaves a field unchanged. `Some` replaces it and is validated with
/// the same rules as a submission, so an explicit empty string or zero amount
/// is refused rather than ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<Decimal>,
    pub receipt_reference: Option<String>,
}

impl ClaimPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.receipt_reference.is_none()
    }

    fn validate(&self) -> Result<(), ClaimError> {
        if let Some(title) = &self.title {
            require_title(title)?;
        }
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        if let Some(amount) = self.amount {
            require_amount(amount)?;
        }
        if let Some(receipt) = &self.receipt_reference {
            require_text("receipt_reference", receipt)?;
        }
        Ok(())
    }

    fn apply_to(self, content: &mut ClaimContent) {
        if let Some(title) = self.title {
            content.title = title;
        }
        if let Some(description) = self.description {
            content.description = description;
        }
        if let Some(category) = self.category {
            content.category = category;
        }
        if let Some(amount) = self.amount {
            content.amount = amount;
        }
        if let Some(receipt) = self.receipt_reference {
            content.receipt_reference = receipt;
        }
    }
}

/// Creates a pending claim owned by the submitting principal
///
/// Any authenticated principal may submit; ownership always comes from the
/// principal, never from the request body.
pub fn submit(principal: &Principal, content: ClaimContent) -> Result<NewClaim, ClaimError> {
    content.validate()?;

    Ok(NewClaim {
        employee_id: principal.id,
        content,
        submitted_at: now(),
    })
}

/// Applies a partial content update while the claim is still pending
pub fn edit_content(
    principal: &Principal,
    claim: &Claim,
    patch: ClaimPatch,
) -> Result<Claim, ClaimError> {
    ensure_owner(principal, claim, "edit")?;
    ensure_status(claim, ClaimStatus::Pending, "edit")?;
    patch.validate()?;

    let mut updated = claim.clone();
    patch.apply_to(updated.content_mut());
    updated.touch();
    Ok(updated)
}

/// Checks that the principal may permanently delete the claim
pub fn withdraw(principal: &Principal, claim: &Claim) -> Result<(), ClaimError> {
    ensure_owner(principal, claim, "withdraw")?;
    ensure_status(claim, ClaimStatus::Pending, "withdraw")?;
    Ok(())
}

/// Records a manager or finance decision
///
/// The stage's required pre-state is checked before the role, so deciding a
/// stage out of order is always `InvalidState` whoever attempts it.
pub fn decide(
    principal: &Principal,
    claim: &Claim,
    stage: ApprovalStage,
    action: DecisionAction,
    notes: Option<String>,
) -> Result<Claim, ClaimError> {
    let operation = match stage {
        ApprovalStage::Manager => "record a manager decision",
        ApprovalStage::Finance => "record a finance decision",
    };
    ensure_status(claim, stage.required_status(), operation)?;

    if principal.role != stage.required_role() {
        return Err(ClaimError::forbidden(format!(
            "{} may not decide the {} stage",
            principal.role, stage
        )));
    }

    let decision = Decision::new(principal.id, notes);
    let next = next_state(claim.state(), stage, action, decision)
        .ok_or_else(|| invalid_state(claim, operation))?;

    let mut updated = claim.clone();
    updated.set_state(next);
    updated.touch();
    Ok(updated)
}

fn next_state(
    current: &ClaimState,
    stage: ApprovalStage,
    action: DecisionAction,
    decision: Decision,
) -> Option<ClaimState> {
    use ApprovalStage::*;
    use DecisionAction::*;

    match (current, stage, action) {
        (ClaimState::Pending, Manager, Approve) => {
            Some(ClaimState::ApprovedByManager { manager: decision })
        }
        (ClaimState::Pending, Manager, Reject) => {
            Some(ClaimState::RejectedByManager { manager: decision })
        }
        (ClaimState::ApprovedByManager { manager }, Finance, Approve) => {
            Some(ClaimState::ApprovedByFinance {
                manager: manager.clone(),
                finance: decision,
            })
        }
        (ClaimState::ApprovedByManager { manager }, Finance, Reject) => {
            Some(ClaimState::RejectedByFinance {
                manager: manager.clone(),
                finance: decision,
            })
        }
        _ => None,
    }
}

fn ensure_owner(principal: &Principal, claim: &Claim, operation: &str) -> Result<(), ClaimError> {
    if !claim.is_owned_by(principal.id) {
        return Err(ClaimError::forbidden(format!(
            "only the submitting employee may {} claim {}",
            operation,
            claim.id()
        )));
    }
    Ok(())
}

fn ensure_status(claim: &Claim, expected: ClaimStatus, operation: &str) -> Result<(), ClaimError> {
    if claim.status() != expected {
        return Err(invalid_state(claim, operation));
    }
    Ok(())
}

fn invalid_state(claim: &Claim, operation: &str) -> ClaimError {
    ClaimError::invalid_state(format!(
        "cannot {} claim {} in status {}",
        operation,
        claim.id(),
        claim.status()
    ))
}
